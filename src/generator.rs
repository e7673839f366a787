//! Single-pass assembly generation.
//!
//! Walks a [Program] once, emitting 64-bit x86 assembly text for a Linux target. The
//! generator never revisits a node and never calls back into the parser; it tracks
//! just enough state — a logical operand-stack counter, a variable table, and a scope
//! stack — to compute every variable's runtime offset without a separate symbol-table
//! pass.
use crate::arena::{Arena, ExprId, StmtId};
use crate::ast::{BinOp, Expr, IfTail, Program, Scope, Stmt, Term};
use crate::error::CompileError;

/// Generate assembly text for `program`, whose nodes live in `arena`.
pub fn generate(program: &Program, arena: &Arena<'_>) -> Result<String, CompileError> {
    let mut gen = Generator::new(arena);
    gen.generate_program(program)?;
    Ok(gen.finish())
}

/// A declared variable: its name and the stack slot permanently assigned to it at its
/// `let` site (spec §3.3).
struct Var<'a> {
    name: &'a str,
    stack_slot: usize,
}

/// Generator state. Borrows the [Arena] read-only; owns everything it produces.
struct Generator<'a, 'arena> {
    arena: &'arena Arena<'a>,
    output: String,
    stack_size: usize,
    vars: Vec<Var<'a>>,
    /// Each entry is the length of `vars` at the moment that scope was entered.
    scopes: Vec<usize>,
    label_counter: usize,
}

impl<'a, 'arena> Generator<'a, 'arena> {
    fn new(arena: &'arena Arena<'a>) -> Self {
        let mut output = String::new();
        output.push_str("global _start\n_start:\n");
        Generator {
            arena,
            output,
            stack_size: 0,
            vars: Vec::new(),
            scopes: Vec::new(),
            label_counter: 0,
        }
    }

    fn finish(mut self) -> String {
        self.emit("mov rax, 60");
        self.emit("xor rdi, rdi");
        self.emit("syscall");
        self.output
    }

    fn emit(&mut self, instruction: &str) {
        self.output.push_str("    ");
        self.output.push_str(instruction);
        self.output.push('\n');
    }

    fn emit_label(&mut self, label: &str) {
        self.output.push_str(label);
        self.output.push_str(":\n");
    }

    fn fresh_label(&mut self) -> String {
        let label = format!("label{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    /// Emit `push reg` and account for it in `stack_size`.
    fn push(&mut self, reg: &str) {
        self.emit(&format!("push {reg}"));
        self.stack_size += 1;
    }

    /// Emit `pop reg` and account for it in `stack_size`.
    fn pop(&mut self, reg: &str) {
        self.emit(&format!("pop {reg}"));
        self.stack_size -= 1;
    }

    /// Emit `push QWORD [rsp + offset]` and account for it in `stack_size`. Same
    /// purpose as [`push`](Self::push), split out because reading a variable's slot
    /// pushes from memory rather than from a register.
    fn push_mem(&mut self, offset: usize) {
        self.emit(&format!("push QWORD [rsp + {offset}]"));
        self.stack_size += 1;
    }

    ////////////////////////////////////////// Scopes //////////////////////////////////////////

    fn enter_scope(&mut self) {
        self.scopes.push(self.vars.len());
    }

    /// Truncate the variable table back to this scope's entry point and reclaim its
    /// stack slots with a single batched `add rsp, N*8`, rather than one pop per
    /// variable.
    fn exit_scope(&mut self) {
        let mark = self.scopes.pop().expect("exit_scope without matching enter_scope");
        let pop_count = self.vars.len() - mark;
        self.vars.truncate(mark);
        if pop_count > 0 {
            self.emit(&format!("add rsp, {}", pop_count * 8));
            self.stack_size -= pop_count;
        }
    }

    fn declare(&mut self, name: &'a str, line: usize) -> Result<(), CompileError> {
        let scope_start = self.scopes.last().copied().unwrap_or(0);
        if self.vars[scope_start..].iter().any(|v| v.name == name) {
            return Err(CompileError::Codegen {
                line,
                message: format!("`{name}` is already declared in this scope"),
            });
        }
        self.vars.push(Var { name, stack_slot: self.stack_size });
        Ok(())
    }

    /// Resolve `name`, searching from most recently declared to oldest, per spec §4.3.2.
    fn resolve(&self, name: &str, line: usize) -> Result<usize, CompileError> {
        self.vars
            .iter()
            .rev()
            .find(|v| v.name == name)
            .map(|v| v.stack_slot)
            .ok_or_else(|| CompileError::Codegen {
                line,
                message: format!("undeclared identifier `{name}`"),
            })
    }

    /// `offset_bytes = (stack_size - 1 - stack_slot) * 8`, per spec §3.4.
    fn offset_of(&self, stack_slot: usize) -> usize {
        (self.stack_size - 1 - stack_slot) * 8
    }

    ////////////////////////////////////////// Statements //////////////////////////////////////////

    fn generate_program(&mut self, program: &Program) -> Result<(), CompileError> {
        for &stmt in program {
            self.generate_stmt(stmt)?;
        }
        Ok(())
    }

    fn generate_scope(&mut self, scope: &Scope) -> Result<(), CompileError> {
        self.enter_scope();
        for &stmt in scope {
            self.generate_stmt(stmt)?;
        }
        self.exit_scope();
        Ok(())
    }

    fn generate_stmt(&mut self, id: StmtId) -> Result<(), CompileError> {
        match self.arena.stmt(id) {
            Stmt::Exit(expr) => {
                let expr = *expr;
                self.generate_expr(expr)?;
                self.pop("rdi");
                self.emit("mov rax, 60");
                self.emit("syscall");
            }
            Stmt::Let(name, expr) => {
                let (name, expr) = (*name, *expr);
                self.declare(name.value().expect("Let ident token has a value"), name.line())?;
                self.generate_expr(expr)?;
            }
            Stmt::Assign(name, expr) => {
                let (name, expr) = (*name, *expr);
                let slot = self.resolve(name.value().expect("Assign ident token has a value"), name.line())?;
                self.generate_expr(expr)?;
                self.pop("rax");
                let offset = self.offset_of(slot);
                self.emit(&format!("mov [rsp + {offset}], rax"));
            }
            Stmt::Scope(scope) => {
                let scope = scope.clone();
                self.generate_scope(&scope)?;
            }
            Stmt::If { cond, body, tail } => {
                let (cond, body, tail) = (*cond, body.clone(), tail.clone());
                self.generate_if(cond, &body, tail.as_ref())?;
            }
        }
        Ok(())
    }

    /// Shared by the top-level `If` and every `Elif` link of its tail: evaluate `cond`,
    /// branch past `body` when it's zero, then fall through to whatever continuation
    /// follows.
    fn generate_if(
        &mut self,
        cond: ExprId,
        body: &Scope,
        tail: Option<&IfTail>,
    ) -> Result<(), CompileError> {
        let end_label = self.fresh_label();
        let next_label = self.fresh_label();

        self.generate_expr(cond)?;
        self.pop("rax");
        self.emit("test rax, rax");
        self.emit(&format!("jz {next_label}"));
        self.generate_scope(body)?;
        self.emit(&format!("jmp {end_label}"));
        self.emit_label(&next_label);

        match tail {
            Some(IfTail::Elif { cond, body, tail }) => {
                self.generate_if(*cond, body, tail.as_deref())?;
            }
            Some(IfTail::Else(body)) => {
                self.generate_scope(body)?;
            }
            None => {}
        }

        self.emit_label(&end_label);
        Ok(())
    }

    ////////////////////////////////////////// Expressions //////////////////////////////////////////

    /// Leaves exactly one value on top of the machine stack: `stack_size` increases by
    /// exactly 1.
    fn generate_expr(&mut self, id: ExprId) -> Result<(), CompileError> {
        match self.arena.expr(id).clone() {
            Expr::Term(Term::IntLit(token)) => {
                let text = token.value().expect("IntLit token has a value");
                self.emit(&format!("mov rax, {text}"));
                self.push("rax");
            }
            Expr::Term(Term::Ident(token)) => {
                let name = token.value().expect("Ident token has a value");
                let slot = self.resolve(name, token.line())?;
                let offset = self.offset_of(slot);
                self.push_mem(offset);
            }
            Expr::Term(Term::Paren(inner)) => {
                self.generate_expr(inner)?;
            }
            Expr::Bin(op, lhs, rhs) => {
                // Right-then-left evaluation order: generate rhs first, then lhs, so
                // that popping afterwards gives lhs in rax and rhs in rbx.
                self.generate_expr(rhs)?;
                self.generate_expr(lhs)?;
                self.pop("rax");
                self.pop("rbx");
                match op {
                    BinOp::Add => self.emit("add rax, rbx"),
                    BinOp::Sub => self.emit("sub rax, rbx"),
                    BinOp::Mul => self.emit("mul rbx"),
                    BinOp::Div => {
                        self.emit("xor rdx, rdx");
                        self.emit("div rbx");
                    }
                }
                self.push("rax");
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////// Tests //////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::parse;
    use crate::scanner::tokenize;

    fn generate_source(source: &str) -> String {
        let tokens = tokenize(source).expect("valid tokens");
        let (program, arena) = parse(tokens).expect("valid parse");
        generate(&program, &arena).expect("valid codegen")
    }

    #[test]
    fn exit_of_literal_emits_the_right_status_via_rdi() {
        let asm = generate_source("exit(0);");
        assert!(asm.contains("global _start"));
        assert!(asm.contains("_start:"));
        assert!(asm.contains("mov rax, 0"));
        assert!(asm.contains("pop rdi"));
        assert!(asm.contains("mov rax, 60"));
        assert!(asm.contains("syscall"));
    }

    #[test]
    fn division_clears_rdx_before_dividing() {
        let asm = generate_source("exit(10 / 2);");
        let div_pos = asm.find("div rbx").expect("a div instruction");
        let xor_pos = asm.find("xor rdx, rdx").expect("an rdx clear");
        assert!(xor_pos < div_pos, "xor rdx, rdx must precede div rbx");
    }

    #[test]
    fn let_then_exit_reads_back_the_declared_slot() {
        let asm = generate_source("let x = 10; exit(x);");
        assert!(asm.contains("push QWORD [rsp + 0]"));
    }

    #[test]
    fn redeclaring_a_name_in_the_same_scope_is_a_codegen_error() {
        let tokens = tokenize("let x = 1; let x = 2;").unwrap();
        let (program, arena) = parse(tokens).unwrap();
        let err = generate(&program, &arena).unwrap_err();
        assert!(matches!(err, CompileError::Codegen { .. }));
    }

    #[test]
    fn undeclared_identifier_is_a_codegen_error() {
        let tokens = tokenize("exit(x);").unwrap();
        let (program, arena) = parse(tokens).unwrap();
        let err = generate(&program, &arena).unwrap_err();
        assert!(matches!(err, CompileError::Codegen { .. }));
    }

    #[test]
    fn shadowing_in_a_nested_scope_is_allowed_and_unwinds_on_exit() {
        // let x = 1; { let x = 7; } exit(x);  — the inner `x` must not clash with the
        // outer one, and must not be visible once its scope ends.
        let asm = generate_source("let x = 1; { let x = 7; } exit(x);");
        // Two distinct `mov rax, N` initialisers, one `add rsp, 8` to tear the inner
        // scope down, and the final read-back resolves to the outer `x`'s slot 0.
        assert!(asm.contains("mov rax, 1"));
        assert!(asm.contains("mov rax, 7"));
        assert!(asm.contains("add rsp, 8"));
        assert!(asm.contains("push QWORD [rsp + 0]"));
    }

    #[test]
    fn if_without_tail_jumps_straight_to_end_label_on_false() {
        let asm = generate_source("if (0) { let y = 1; }");
        assert!(asm.contains("test rax, rax"));
        assert!(asm.contains("jz label"));
        assert!(asm.contains("jmp label"));
    }

    #[test]
    fn if_elif_else_chain_emits_one_label_pair_per_branch() {
        let asm = generate_source(
            "let a = 0; if (0) { a = 1; } elif (0) { a = 2; } else { a = 3; } exit(a);",
        );
        let jz_count = asm.matches("jz label").count();
        let jmp_count = asm.matches("jmp label").count();
        assert_eq!(2, jz_count, "one jz per conditional branch (if, elif)");
        assert_eq!(2, jmp_count, "one jmp-past-tail per conditional branch");
    }

    #[test]
    fn binary_expression_evaluates_rhs_before_lhs() {
        // `10 - 3`: rhs (3) generated first, so its `mov rax, 3` appears before lhs's
        // `mov rax, 10` in the output.
        let asm = generate_source("exit(10 - 3);");
        let rhs_pos = asm.find("mov rax, 3").expect("rhs literal");
        let lhs_pos = asm.find("mov rax, 10").expect("lhs literal");
        assert!(rhs_pos < lhs_pos, "rhs must be generated before lhs");
    }
}
