//! Fargate task sizing
//!
//! Fargate only accepts a fixed set of (cpu, memory) combinations. A request is
//! rounded up to the smallest supported combination that satisfies both values.

use crate::error::{Result, TemplateError};
use std::fmt;

const MIB: u64 = 1024 * 1024;

/// Supported cpu units and, per cpu tier, the accepted memory sizes in MiB.
const FARGATE_TIERS: &[(u64, &[u64])] = &[
    (256, &[512, 1024, 2048]),
    (512, &[1024, 2048, 3072, 4096]),
    (1024, &[2048, 3072, 4096, 5120, 6144, 7168, 8192]),
    (
        2048,
        &[
            4096, 5120, 6144, 7168, 8192, 9216, 10240, 11264, 12288, 13312, 14336, 15360, 16384,
        ],
    ),
    (
        4096,
        &[
            8192, 9216, 10240, 11264, 12288, 13312, 14336, 15360, 16384, 17408, 18432, 19456,
            20480, 21504, 22528, 23552, 24576, 25600, 26624, 27648, 28672, 29696, 30720,
        ],
    ),
];

/// A supported task size: cpu units and memory in MiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSize {
    pub cpu: u64,
    pub memory: u64,
}

impl TaskSize {
    pub const SMALLEST: TaskSize = TaskSize {
        cpu: 256,
        memory: 512,
    };

    pub fn cpu_string(&self) -> String {
        self.cpu.to_string()
    }

    pub fn memory_string(&self) -> String {
        self.memory.to_string()
    }
}

impl fmt::Display for TaskSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cpu / {} MiB", self.cpu, self.memory)
    }
}

/// Map a request to the nearest supported tier.
///
/// `memory_bytes` and `cpu_units` are independent; a zero in one dimension only
/// means that dimension is unconstrained.
pub fn fit(memory_bytes: u64, cpu_units: u64) -> Result<TaskSize> {
    if memory_bytes == 0 && cpu_units == 0 {
        return Ok(TaskSize::SMALLEST);
    }

    for &(cpu, memories) in FARGATE_TIERS {
        if cpu_units > cpu {
            continue;
        }
        if let Some(&memory) = memories.iter().find(|&&m| memory_bytes <= m * MIB) {
            return Ok(TaskSize { cpu, memory });
        }
    }

    Err(TemplateError::UnsupportedResources {
        cpu: cpu_units,
        memory: memory_bytes,
    })
}
