//! Script pipeline: lex, parse, lower and build

use llir::Context;

use crate::builder::StackBuilder;
use crate::common::{CompileError, CompileResult};
use crate::fmt::value_name;
use crate::script::{Lexer, Lowerer, Parser, Step};

/// Debug switches for a script run
#[derive(Debug, Clone, Default)]
pub struct ScriptConfig {
    pub dump_tokens: bool,
    pub dump_actions: bool,
    pub verbose: bool,
}

/// What a script run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptOutput {
    /// Every module the script declared, printed in order of first mention
    pub module_text: String,
    /// Values taken by `last` statements, in order
    pub last: Vec<String>,
}

/// Runs scripts against a fresh context
pub struct Pipeline {
    config: ScriptConfig,
}

impl Pipeline {
    pub fn new(config: ScriptConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }

    /// Execute a whole script. Each statement is lowered and applied before
    /// the next one is looked at; the first failure stops the run.
    pub fn run(&self, source: &str) -> CompileResult<ScriptOutput> {
        if self.config.dump_tokens {
            let tokens = Lexer::new(source).tokenize_all()?;
            eprintln!("=== Tokens ===");
            for token in &tokens {
                eprintln!("{:?} {}", token.span, token.kind);
            }
            eprintln!("=== End Tokens ===\n");
        }

        let script = Parser::new(source).parse_script()?;
        if self.config.verbose {
            tracing::info!(statements = script.statements.len(), "parsed script");
        }

        let mut ctx = Context::new();
        let mut lowerer = Lowerer::new();
        let mut last = Vec::new();
        {
            let mut sb = StackBuilder::new(&mut ctx);
            for stmt in &script.statements {
                let step = lowerer.lower(stmt, &mut sb)?;
                if self.config.dump_actions {
                    eprintln!("{:?}: {:?}", stmt.span, step);
                }
                match step {
                    Step::Action(action) => sb
                        .execute(action)
                        .map_err(|e| CompileError::build(e, stmt.span))?,
                    Step::Last => {
                        let value = sb.last().map_err(|e| CompileError::build(e, stmt.span))?;
                        last.push(value_name(sb.context(), value));
                    }
                }
            }
        }

        let module_text = lowerer
            .modules()
            .iter()
            .map(|&module| llir::print_module(&ctx, module))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(ScriptOutput { module_text, last })
    }
}

/// Run `source` with the given switches
pub fn run_script(source: &str, config: &ScriptConfig) -> CompileResult<ScriptOutput> {
    Pipeline::new(config.clone()).run(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuildError;
    use crate::common::Span;
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> CompileResult<ScriptOutput> {
        run_script(source, &ScriptConfig::default())
    }

    #[test]
    fn test_sum_through_a_slot() {
        let source = "\
module demo
function @sum(i8, i8) -> i8
block entry
alloc i8 %a
store $0, %a
load i8 %a
add _, $1
ret _
";
        let output = run(source).unwrap();
        assert_eq!(
            output.module_text,
            "; ModuleID = 'demo'\n\ndefine i8 @sum(i8 %0, i8 %1) {\nentry:\n  %a = alloca i8\n  store i8 %0, i8* %a\n  %2 = load i8, i8* %a\n  %3 = add i8 %2, %1\n  ret i8 %3\n}\n"
        );
        assert!(output.last.is_empty());
    }

    #[test]
    fn test_branches_and_phi() {
        let source = "\
module flow
function @max(i32, i32) -> i32
pop
block entry
block big
block small
block done
set_block entry
push $0
push $1
cmp sgt
condbr
set_block big
br done
set_block small
br done
set_block done
phi [$0, big], [$1, small]
ret _
";
        let output = run(source).unwrap();
        assert_eq!(
            output.module_text,
            "; ModuleID = 'flow'

define i32 @max(i32 %0, i32 %1) {
entry:
  %2 = icmp sgt i32 %0, %1
  br i1 %2, label %big, label %small

big:
  br label %done

small:
  br label %done

done:
  %3 = phi i32 [ %0, %big ], [ %1, %small ]
  ret i32 %3
}
"
        );
    }

    #[test]
    fn test_declaration_and_vararg_call() {
        let source = "\
module io
function @printf(i8*, ...) -> i32
pop
function @main() -> i32
pop
block entry
alloc i8
call @printf(_, 7_i32)
ret _
";
        let output = run(source).unwrap();
        assert_eq!(
            output.module_text,
            "; ModuleID = 'io'

declare i32 @printf(i8*, ...)

define i32 @main() {
entry:
  %0 = alloca i8
  %1 = call i32 @printf(i8* %0, i32 7)
  ret i32 %1
}
"
        );
    }

    #[test]
    fn test_last_reports_values() {
        let source = "\
module m
function @f(i8) -> i8
pop
block entry
push 3_i8
last
keep_stack
add $0, $0
last
last
";
        let output = run(source).unwrap();
        assert_eq!(output.last, vec!["i8 3", "%1", "%1"]);
    }

    #[test]
    fn test_build_errors_carry_statement_span() {
        let source = "module m\nfunction @f() -> i8\npop\nblock entry\nadd\n";
        let err = run(source).unwrap_err();
        let start = source.find("add").unwrap();
        assert_eq!(err.span(), Some(Span::new(start, start + 3)));
        assert!(matches!(
            err,
            CompileError::Build {
                source: BuildError::StackUnderflow { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_front_end_errors_stop_the_run() {
        let err = run("module m\nload i8 %nowhere\n").unwrap_err();
        assert!(matches!(err, CompileError::Lowering { .. }));

        let err = run("module m\nfrobnicate\n").unwrap_err();
        assert!(matches!(err, CompileError::Parser { .. }));
    }

    #[test]
    fn test_multiple_modules_print_in_order() {
        let output = run("module b\nmodule a\nmodule b\n").unwrap();
        assert_eq!(output.module_text, "; ModuleID = 'b'\n\n; ModuleID = 'a'\n");
    }
}
