use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const DEMO: &str = r#"
name: demo
services:
  web:
    image: nginx
    ports:
      - target: 80
x-aws-loadbalancer: arn:aws:elasticloadbalancing:eu-west-1:123456789012:loadbalancer/net/demo/1
x-aws-vpc: vpc-123
x-aws-subnets:
  - subnet-a
  - subnet-b
"#;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn write_project(&self, content: &str) {
        fs::write(self.root.path().join("stackflow.yaml"), content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("stackflow").unwrap();
        cmd.current_dir(self.path())
            .env_remove("STACKFLOW_FILE")
            .env_remove("RUST_LOG");
        cmd
    }
}
