use crate::translator::{at_c, at_s};

/// Address the stack starts at on the Hack platform.
pub const STACK_BASE: u16 = 256;
pub const ENTRY_FUNCTION: &str = "Sys.init";

/// Prologue that initialises SP and jumps to the entry function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap {
    pub stack_base: u16,
    pub entry: String,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Bootstrap {
            stack_base: STACK_BASE,
            entry: ENTRY_FUNCTION.to_string(),
        }
    }
}

impl Bootstrap {
    pub fn with_entry(entry: impl Into<String>) -> Self {
        Bootstrap {
            entry: entry.into(),
            ..Self::default()
        }
    }

    pub fn emit(&self) -> String {
        svec![
            "// bootstrap",
            at_c(u32::from(self.stack_base)),
            "D=A",
            "@SP",
            "M=D",
            at_s(&self.entry),
            "0;JMP"
        ]
        .join("\n")
            + "\n"
    }
}

#[test]
fn test_default_bootstrap() {
    assert_eq!(
        Bootstrap::default().emit(),
        "// bootstrap\n@256\nD=A\n@SP\nM=D\n@Sys.init\n0;JMP\n"
    );
}

#[test]
fn test_custom_entry() {
    let text = Bootstrap::with_entry("Main.main").emit();
    assert!(text.contains("@Main.main\n0;JMP"));
}
