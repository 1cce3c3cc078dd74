//! Emits GNU-assembler x86-64 text (Intel syntax) from the AST.
//!
//! Evaluation is a pure stack machine: every expression node pushes exactly
//! one value, every binary operator pops two and pushes one. No register
//! allocation, no control flow, no optimization.

use std::fmt;

use thiserror::Error;

use crate::ast::{BinOp, Node};

/// Errors only reachable through an internal bug — the parser's own
/// invariants (Assign's lhs is always a LocalVar, every node's children are
/// populated) prevent these in practice.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    #[error("assignment target is not a local variable")]
    InvalidAssignTarget,
}

pub type Result<T> = std::result::Result<T, CodegenError>;

/// One emitted instruction. A closed enum plus a `Display` impl, rather than
/// scattering `format!` calls through the tree walk, keeps the exact
/// four-space-indented lowercase Intel-syntax line in one place.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Instruction {
    Push(i64),
    PushReg(&'static str),
    Pop(&'static str),
    Add,
    Sub,
    Imul,
    Cqo,
    Idiv,
    Cmp,
    SetCc(&'static str),
    Movzb,
    MovRegReg(&'static str, &'static str),
    MovRegMem(&'static str, &'static str),
    MovMemReg(&'static str, &'static str),
    MovRegImm(&'static str, usize),
    SubRegImm(&'static str, usize),
    Ret,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Push(n) => write!(f, "    push {n}"),
            Instruction::PushReg(r) => write!(f, "    push {r}"),
            Instruction::Pop(r) => write!(f, "    pop {r}"),
            Instruction::Add => write!(f, "    add rax, rdi"),
            Instruction::Sub => write!(f, "    sub rax, rdi"),
            Instruction::Imul => write!(f, "    imul rax, rdi"),
            Instruction::Cqo => write!(f, "    cqo"),
            Instruction::Idiv => write!(f, "    idiv rdi"),
            Instruction::Cmp => write!(f, "    cmp rax, rdi"),
            Instruction::SetCc(cc) => write!(f, "    set{cc} al"),
            Instruction::Movzb => write!(f, "    movzb rax, al"),
            Instruction::MovRegReg(dst, src) => write!(f, "    mov {dst}, {src}"),
            Instruction::MovRegMem(dst, src) => write!(f, "    mov {dst}, [{src}]"),
            Instruction::MovMemReg(dst, src) => write!(f, "    mov [{dst}], {src}"),
            Instruction::MovRegImm(dst, n) => write!(f, "    mov {dst}, {n}"),
            Instruction::SubRegImm(dst, n) => write!(f, "    sub {dst}, {n}"),
            Instruction::Ret => write!(f, "    ret"),
        }
    }
}

struct Generator {
    out: Vec<Instruction>,
}

impl Generator {
    fn new() -> Self {
        Self { out: Vec::new() }
    }

    fn emit(&mut self, inst: Instruction) {
        self.out.push(inst);
    }

    fn epilogue(&mut self) {
        self.emit(Instruction::MovRegReg("rsp", "rbp"));
        self.emit(Instruction::Pop("rbp"));
        self.emit(Instruction::Ret);
    }

    /// Pushes the address of a LocalVar onto the stack: `rax = rbp - offset`.
    fn gen_addr(&mut self, node: &Node) -> Result<()> {
        match node {
            Node::LocalVar { offset, .. } => {
                self.emit(Instruction::MovRegReg("rax", "rbp"));
                self.emit(Instruction::SubRegImm("rax", *offset));
                self.emit(Instruction::PushReg("rax"));
                Ok(())
            }
            _ => Err(CodegenError::InvalidAssignTarget),
        }
    }

    /// Post-order traversal: lhs, then rhs, then the node's own emission.
    fn gen(&mut self, node: &Node) -> Result<()> {
        match node {
            Node::Num(n) => self.emit(Instruction::Push(*n)),
            Node::LocalVar { .. } => {
                self.gen_addr(node)?;
                self.emit(Instruction::Pop("rax"));
                self.emit(Instruction::MovRegMem("rax", "rax"));
                self.emit(Instruction::PushReg("rax"));
            }
            Node::BinOp { op, lhs, rhs } => {
                self.gen(lhs)?;
                self.gen(rhs)?;
                self.emit(Instruction::Pop("rdi"));
                self.emit(Instruction::Pop("rax"));
                match op {
                    BinOp::Add => self.emit(Instruction::Add),
                    BinOp::Sub => self.emit(Instruction::Sub),
                    BinOp::Mul => self.emit(Instruction::Imul),
                    BinOp::Div => {
                        self.emit(Instruction::Cqo);
                        self.emit(Instruction::Idiv);
                    }
                    BinOp::Eq => {
                        self.emit(Instruction::Cmp);
                        self.emit(Instruction::SetCc("e"));
                        self.emit(Instruction::Movzb);
                    }
                    BinOp::Neq => {
                        self.emit(Instruction::Cmp);
                        self.emit(Instruction::SetCc("ne"));
                        self.emit(Instruction::Movzb);
                    }
                    BinOp::Lt => {
                        self.emit(Instruction::Cmp);
                        self.emit(Instruction::SetCc("l"));
                        self.emit(Instruction::Movzb);
                    }
                    BinOp::Le => {
                        self.emit(Instruction::Cmp);
                        self.emit(Instruction::SetCc("le"));
                        self.emit(Instruction::Movzb);
                    }
                }
                self.emit(Instruction::PushReg("rax"));
            }
            Node::Assign { lhs, rhs } => {
                self.gen_addr(lhs)?;
                self.gen(rhs)?;
                self.emit(Instruction::Pop("rdi"));
                self.emit(Instruction::Pop("rax"));
                self.emit(Instruction::MovMemReg("rax", "rdi"));
                self.emit(Instruction::PushReg("rdi"));
            }
            Node::Return(lhs) => {
                self.gen(lhs)?;
                self.emit(Instruction::Pop("rax"));
                self.epilogue();
            }
        }
        Ok(())
    }

    /// One top-level statement: evaluate then discard the result, unless the
    /// statement was a `return`, which already ended with its own epilogue.
    fn gen_statement(&mut self, node: &Node) -> Result<()> {
        self.gen(node)?;
        if !matches!(node, Node::Return(_)) {
            self.emit(Instruction::Pop("rax"));
        }
        Ok(())
    }
}

/// Generate the full assembly program text for `statements`, given the
/// `frame_size` bytes of local storage the parser computed.
pub fn generate(statements: &[Node], frame_size: usize) -> Result<String> {
    let mut gen = Generator::new();

    for statement in statements {
        gen.gen_statement(statement)?;
    }

    let mut lines = Vec::new();
    lines.push(".intel_syntax noprefix".to_string());
    lines.push(".globl main".to_string());
    lines.push(String::new());
    lines.push("main:".to_string());
    lines.push("    push rbp".to_string());
    lines.push("    mov rbp, rsp".to_string());
    lines.push(format!("    sub rsp, {frame_size}"));
    for inst in &gen.out {
        lines.push(inst.to_string());
    }
    lines.push("    mov rsp, rbp".to_string());
    lines.push("    pop rbp".to_string());
    lines.push("    ret".to_string());
    lines.push(String::new());

    Ok(lines.join("\n"))
}
