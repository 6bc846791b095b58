//! The message-send ABI boundary (spec §4.6).

pub const DEFAULT_ARG_SLOTS: usize = 4;
pub const MAX_ARG_SLOTS: usize = 16;
pub const DEFAULT_RUNTIME_DISPATCH_SYMBOL: &str = "objc3_msgsend_i32";
pub const SELECTOR_GLOBAL_ORDERING: &str = "lexicographic";

/// User-facing configuration (spec §6).
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub max_message_send_args: usize,
    pub runtime_dispatch_symbol: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_message_send_args: DEFAULT_ARG_SLOTS,
            runtime_dispatch_symbol: DEFAULT_RUNTIME_DISPATCH_SYMBOL.to_string(),
        }
    }
}

/// The normalized, validated ABI boundary baked into the IR header.
#[derive(Debug, Clone)]
pub struct LoweringContract {
    pub runtime_dispatch_arg_slots: usize,
    pub runtime_dispatch_symbol: String,
}

impl LoweringContract {
    pub fn try_build(options: &CompileOptions) -> Result<Self, String> {
        if options.max_message_send_args > MAX_ARG_SLOTS {
            return Err(format!(
                "invalid lowering contract max_message_send_args: {} (expected <= {})",
                options.max_message_send_args, MAX_ARG_SLOTS
            ));
        }
        if !is_valid_runtime_dispatch_symbol(&options.runtime_dispatch_symbol) {
            return Err(format!(
                "invalid lowering contract runtime_dispatch_symbol (expected [A-Za-z_.$][A-Za-z0-9_.$]*): {}",
                options.runtime_dispatch_symbol
            ));
        }
        Ok(Self {
            runtime_dispatch_arg_slots: options.max_message_send_args,
            runtime_dispatch_symbol: options.runtime_dispatch_symbol.clone(),
        })
    }

    /// A replay key embedded in the IR header so tests can detect silent drift.
    pub fn replay_key(&self) -> String {
        format!(
            "runtime_dispatch_symbol={};runtime_dispatch_arg_slots={};selector_global_ordering={}",
            self.runtime_dispatch_symbol, self.runtime_dispatch_arg_slots, SELECTOR_GLOBAL_ORDERING
        )
    }
}

fn is_symbol_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$' || c == '.'
}

fn is_symbol_body(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'
}

pub fn is_valid_runtime_dispatch_symbol(symbol: &str) -> bool {
    let mut chars = symbol.chars();
    match chars.next() {
        Some(c) if is_symbol_start(c) => {}
        _ => return false,
    }
    chars.all(is_symbol_body)
}

/// Maps a compound-assignment operator spelling to its binop mnemonic, used
/// by the IR emitter when lowering `x += y` to `load; binop; store`.
pub fn compound_assignment_opcode(op: &crate::ast::AssignOp) -> Option<&'static str> {
    use crate::ast::AssignOp::*;
    Some(match op {
        Assign => return None,
        AddAssign => "add",
        SubAssign => "sub",
        MulAssign => "mul",
        DivAssign => "sdiv",
        ModAssign => "srem",
        AndAssign => "and",
        OrAssign => "or",
        XorAssign => "xor",
        ShlAssign => "shl",
        ShrAssign => "ashr",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_default_symbol() {
        assert!(is_valid_runtime_dispatch_symbol(DEFAULT_RUNTIME_DISPATCH_SYMBOL));
    }

    #[test]
    fn rejects_leading_digit() {
        assert!(!is_valid_runtime_dispatch_symbol("1abc"));
    }

    #[test]
    fn rejects_too_many_arg_slots() {
        let options = CompileOptions {
            max_message_send_args: 17,
            ..Default::default()
        };
        assert!(LoweringContract::try_build(&options).is_err());
    }

    #[test]
    fn replay_key_embeds_all_three_fields() {
        let contract = LoweringContract::try_build(&CompileOptions::default()).unwrap();
        let key = contract.replay_key();
        assert!(key.contains("objc3_msgsend_i32"));
        assert!(key.contains("runtime_dispatch_arg_slots=4"));
        assert!(key.contains("lexicographic"));
    }
}
