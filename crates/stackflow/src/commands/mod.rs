pub mod convert;
pub mod down;
pub mod unsupported;
pub mod up;
pub mod validate;
