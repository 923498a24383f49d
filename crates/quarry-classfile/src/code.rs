use crate::constant_pool::{ConstantPool, CpInfo, MemberRef};
use crate::error::{Error, Result};
use crate::reader::Reader;

/// The parsed `Code` attribute of one method: the instruction-level events
/// this system cares about, plus line and try/catch metadata. The verbatim
/// bytecode is not retained.
#[derive(Debug, Clone)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub events: Vec<CodeEvent>,
    pub try_regions: Vec<TryRegion>,
    line_numbers: Vec<(u16, u32)>,
}

impl CodeAttribute {
    /// Source line for a bytecode offset, `0` when the table has no entry.
    pub fn line_at(&self, pc: u16) -> u32 {
        self.line_numbers
            .iter()
            .take_while(|(start_pc, _)| *start_pc <= pc)
            .last()
            .map(|(_, line)| *line)
            .unwrap_or(0)
    }

    /// The first source line of the method body, `0` when unknown.
    pub fn first_line(&self) -> u32 {
        self.line_numbers.iter().map(|(_, line)| *line).min().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeKind {
    Virtual,
    Interface,
    Special,
    Static,
}

/// One structural event extracted from an instruction.
#[derive(Debug, Clone)]
pub enum CodeEvent {
    FieldGet { target: MemberRef, pc: u16 },
    FieldSet { target: MemberRef, pc: u16 },
    Invoke { kind: InvokeKind, target: MemberRef, pc: u16 },
    /// An `invokedynamic` call site; the bootstrap index is resolved against
    /// the class-level `BootstrapMethods` table by the caller.
    InvokeDynamic { bootstrap_index: u16, name: String, descriptor: String, pc: u16 },
    InstanceOf { class_name: String, pc: u16 },
    /// A class literal loaded via `ldc`/`ldc_w`.
    ClassConstant { class_name: String, pc: u16 },
}

/// One exception-table entry. `catch_type == None` is a finally handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryRegion {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: Option<String>,
}

pub(crate) fn parse_code(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<CodeAttribute> {
    let max_stack = reader.read_u2()?;
    let max_locals = reader.read_u2()?;
    let code_length = reader.read_u4()? as usize;
    let code = reader.read_bytes(code_length)?;
    let events = scan(code, cp)?;

    let exception_table_length = reader.read_u2()? as usize;
    let mut try_regions = Vec::with_capacity(exception_table_length);
    for _ in 0..exception_table_length {
        let start_pc = reader.read_u2()?;
        let end_pc = reader.read_u2()?;
        let handler_pc = reader.read_u2()?;
        let catch_type_index = reader.read_u2()?;
        let catch_type = if catch_type_index == 0 {
            None
        } else {
            Some(cp.get_class_name(catch_type_index)?)
        };
        try_regions.push(TryRegion { start_pc, end_pc, handler_pc, catch_type });
    }

    let mut line_numbers = Vec::new();
    let attributes_count = reader.read_u2()? as usize;
    for _ in 0..attributes_count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        let info = reader.read_bytes(length)?;
        if cp.get_utf8(name_index)? == "LineNumberTable" {
            let mut sub = Reader::new(info);
            let num = sub.read_u2()? as usize;
            for _ in 0..num {
                let start_pc = sub.read_u2()?;
                let line = sub.read_u2()? as u32;
                line_numbers.push((start_pc, line));
            }
            sub.ensure_empty()?;
        }
    }
    line_numbers.sort_unstable();

    Ok(CodeAttribute { max_stack, max_locals, events, try_regions, line_numbers })
}

/// Walk the instruction stream, emitting events for the instructions that
/// create structural references. Everything else is length-decoded and
/// skipped.
fn scan(code: &[u8], cp: &ConstantPool) -> Result<Vec<CodeEvent>> {
    let mut events = Vec::new();
    let mut reader = Reader::new(code);
    let mut pc: usize = 0;

    while pc < code.len() {
        let opcode = reader.read_u1()?;
        let at = pc as u16;
        match opcode {
            // ldc
            0x12 => {
                let index = reader.read_u1()? as u16;
                if let CpInfo::Class { .. } = cp.get(index)? {
                    events.push(CodeEvent::ClassConstant {
                        class_name: cp.get_class_name(index)?,
                        pc: at,
                    });
                }
                pc += 2;
            }
            // ldc_w
            0x13 => {
                let index = reader.read_u2()?;
                if let CpInfo::Class { .. } = cp.get(index)? {
                    events.push(CodeEvent::ClassConstant {
                        class_name: cp.get_class_name(index)?,
                        pc: at,
                    });
                }
                pc += 3;
            }
            // getstatic / putstatic / getfield / putfield
            0xb2..=0xb5 => {
                let target = cp.get_member_ref(reader.read_u2()?)?;
                let event = if opcode == 0xb2 || opcode == 0xb4 {
                    CodeEvent::FieldGet { target, pc: at }
                } else {
                    CodeEvent::FieldSet { target, pc: at }
                };
                events.push(event);
                pc += 3;
            }
            // invokevirtual / invokespecial / invokestatic
            0xb6..=0xb8 => {
                let kind = match opcode {
                    0xb6 => InvokeKind::Virtual,
                    0xb7 => InvokeKind::Special,
                    _ => InvokeKind::Static,
                };
                let target = cp.get_member_ref(reader.read_u2()?)?;
                events.push(CodeEvent::Invoke { kind, target, pc: at });
                pc += 3;
            }
            // invokeinterface (index, count, zero byte)
            0xb9 => {
                let target = cp.get_member_ref(reader.read_u2()?)?;
                reader.read_u2()?;
                events.push(CodeEvent::Invoke { kind: InvokeKind::Interface, target, pc: at });
                pc += 5;
            }
            // invokedynamic (index, two zero bytes)
            0xba => {
                let (bootstrap_index, name, descriptor) =
                    cp.get_invoke_dynamic(reader.read_u2()?)?;
                reader.read_u2()?;
                events.push(CodeEvent::InvokeDynamic { bootstrap_index, name, descriptor, pc: at });
                pc += 5;
            }
            // instanceof
            0xc1 => {
                let class_name = cp.get_class_name(reader.read_u2()?)?;
                events.push(CodeEvent::InstanceOf { class_name, pc: at });
                pc += 3;
            }
            // tableswitch
            0xaa => {
                let padding = (4 - (pc + 1) % 4) % 4;
                reader.read_bytes(padding)?;
                reader.read_u4()?; // default
                let low = reader.read_u4()? as i32;
                let high = reader.read_u4()? as i32;
                let entries = (high as i64 - low as i64 + 1).max(0) as usize;
                reader.read_bytes(entries * 4)?;
                pc += 1 + padding + 12 + entries * 4;
            }
            // lookupswitch
            0xab => {
                let padding = (4 - (pc + 1) % 4) % 4;
                reader.read_bytes(padding)?;
                reader.read_u4()?; // default
                let npairs = reader.read_u4()? as usize;
                reader.read_bytes(npairs * 8)?;
                pc += 1 + padding + 8 + npairs * 8;
            }
            // wide
            0xc4 => {
                let widened = reader.read_u1()?;
                // wide iinc carries two extra operand bytes.
                let operands = if widened == 0x84 { 4 } else { 2 };
                reader.read_bytes(operands)?;
                pc += 2 + operands;
            }
            _ => {
                let operands = plain_operand_len(opcode)?;
                reader.read_bytes(operands)?;
                pc += 1 + operands;
            }
        }
    }

    Ok(events)
}

/// Operand byte count for opcodes with a fixed layout and no structural
/// references this scan extracts.
fn plain_operand_len(opcode: u8) -> Result<usize> {
    Ok(match opcode {
        // nop, constants, implicit loads/stores, array ops, stack ops,
        // arithmetic, conversions, comparisons, returns, monitors
        0x00..=0x0f
        | 0x1a..=0x35
        | 0x3b..=0x83
        | 0x85..=0x98
        | 0xac..=0xb1
        | 0xbe
        | 0xbf
        | 0xc2
        | 0xc3 => 0,
        // bipush, explicit loads/stores, newarray, ret
        0x10 | 0x15..=0x19 | 0x36..=0x3a | 0xa9 | 0xbc => 1,
        // sipush, ldc2_w, iinc, branches, jsr, new, anewarray, checkcast,
        // ifnull/ifnonnull
        0x11 | 0x14 | 0x84 | 0x99..=0xa8 | 0xbb | 0xbd | 0xc0 | 0xc6 | 0xc7 => 2,
        // multianewarray
        0xc5 => 3,
        // goto_w, jsr_w
        0xc8 | 0xc9 => 4,
        other => return Err(Error::InvalidOpcode(other)),
    })
}
