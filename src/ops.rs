//! # ops
//!
//! One plain function per opcode, looked up by opcode class and, for the
//! 0x0, 0x8, 0xE and 0xF families, a sub-key. Handlers run after the program
//! counter has moved past the instruction, so "skip" is one more +2 and
//! "repeat" is -2.
use crate::error::Chip8Error;
use crate::instruction::Instruction;
use crate::machine::{KeyWait, MachineState, QuirkMode};
use crate::memory::MemoryMap;
use rand::Rng;

pub type Handler = fn(&mut MachineState, Instruction) -> Result<(), Chip8Error>;

/// addresses wrap inside the 4K space
const ADDR_MASK: u16 = 0x0FFF;

/// the handler for an instruction, if it has one
pub fn lookup(inst: &Instruction) -> Option<Handler> {
    let handler: Handler = match inst.opcode_class {
        0x0 => match inst.nn {
            0xE0 if inst.x == 0 => clear_screen,
            0xEE if inst.x == 0 => subroutine_return,
            _ => return None,
        },
        0x1 => jump,
        0x2 => call,
        0x3 => skip_eq_immediate,
        0x4 => skip_ne_immediate,
        0x5 => skip_eq_register,
        0x6 => set_immediate,
        0x7 => add_immediate,
        0x8 => match inst.n {
            0x0 => set_register,
            0x1 => or,
            0x2 => and,
            0x3 => xor,
            0x4 => add_register,
            0x5 => sub,
            0x6 => shift_right,
            0x7 => sub_reversed,
            0xE => shift_left,
            _ => return None,
        },
        0x9 => skip_ne_register,
        0xA => set_index,
        0xB => jump_with_offset,
        0xC => random,
        0xD => draw,
        0xE => match inst.nn {
            0x9E => skip_if_key,
            0xA1 => skip_unless_key,
            _ => return None,
        },
        0xF => match inst.nn {
            0x07 => read_delay_timer,
            0x0A => wait_for_key,
            0x15 => set_delay_timer,
            0x18 => set_sound_timer,
            0x1E => add_to_index,
            0x29 => font_glyph,
            0x33 => binary_coded_decimal,
            0x55 => store_registers,
            0x65 => load_registers,
            _ => return None,
        },
        _ => return None,
    };
    Some(handler)
}

fn vx(m: &MachineState, inst: Instruction) -> u8 {
    m.registers[inst.x as usize]
}

fn vy(m: &MachineState, inst: Instruction) -> u8 {
    m.registers[inst.y as usize]
}

fn set_vx(m: &mut MachineState, inst: Instruction, value: u8) {
    m.registers[inst.x as usize] = value;
}

// 00E0
fn clear_screen(m: &mut MachineState, _: Instruction) -> Result<(), Chip8Error> {
    m.framebuffer.clear();
    Ok(())
}

// 00EE
fn subroutine_return(m: &mut MachineState, _: Instruction) -> Result<(), Chip8Error> {
    m.program_counter = m.stack.pop()?;
    Ok(())
}

// 1NNN
fn jump(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    m.program_counter = inst.nnn;
    Ok(())
}

// 2NNN
fn call(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    m.stack.push(m.program_counter)?;
    m.program_counter = inst.nnn;
    Ok(())
}

// 3XNN
fn skip_eq_immediate(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    if vx(m, inst) == inst.nn {
        m.skip();
    }
    Ok(())
}

// 4XNN
fn skip_ne_immediate(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    if vx(m, inst) != inst.nn {
        m.skip();
    }
    Ok(())
}

// 5XY0
fn skip_eq_register(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    if vx(m, inst) == vy(m, inst) {
        m.skip();
    }
    Ok(())
}

// 9XY0
fn skip_ne_register(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    if vx(m, inst) != vy(m, inst) {
        m.skip();
    }
    Ok(())
}

// 6XNN
fn set_immediate(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    set_vx(m, inst, inst.nn);
    Ok(())
}

// 7XNN, no carry
fn add_immediate(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    set_vx(m, inst, vx(m, inst).wrapping_add(inst.nn));
    Ok(())
}

// 8XY0
fn set_register(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    set_vx(m, inst, vy(m, inst));
    Ok(())
}

/// 8XY1..8XY3 share their flag behaviour
fn logic(m: &mut MachineState, inst: Instruction, op: fn(u8, u8) -> u8) {
    set_vx(m, inst, op(vx(m, inst), vy(m, inst)));
    if m.quirks == QuirkMode::Legacy {
        m.set_flag(false);
    }
}

// 8XY1
fn or(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    logic(m, inst, |a, b| a | b);
    Ok(())
}

// 8XY2
fn and(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    logic(m, inst, |a, b| a & b);
    Ok(())
}

// 8XY3
fn xor(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    logic(m, inst, |a, b| a ^ b);
    Ok(())
}

// 8XY4
fn add_register(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    let (result, carry) = vx(m, inst).overflowing_add(vy(m, inst));
    set_vx(m, inst, result);
    m.set_flag(carry);
    Ok(())
}

// 8XY5: VF is set only when VX is strictly greater
fn sub(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    let (a, b) = (vx(m, inst), vy(m, inst));
    set_vx(m, inst, a.wrapping_sub(b));
    m.set_flag(a > b);
    Ok(())
}

// 8XY7
fn sub_reversed(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    let (a, b) = (vx(m, inst), vy(m, inst));
    set_vx(m, inst, b.wrapping_sub(a));
    m.set_flag(b > a);
    Ok(())
}

fn shift_operand(m: &MachineState, inst: Instruction) -> u8 {
    match m.quirks {
        QuirkMode::Legacy => vy(m, inst),
        QuirkMode::Modern => vx(m, inst),
    }
}

// 8XY6
fn shift_right(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    let operand = shift_operand(m, inst);
    set_vx(m, inst, operand >> 1);
    m.set_flag(operand & 0x01 == 1);
    Ok(())
}

// 8XYE
fn shift_left(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    let operand = shift_operand(m, inst);
    set_vx(m, inst, operand << 1);
    m.set_flag(operand & 0x80 != 0);
    Ok(())
}

// ANNN
fn set_index(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    m.index = inst.nnn;
    Ok(())
}

// BNNN; modern reads the offset register from the X nibble
fn jump_with_offset(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    let offset = match m.quirks {
        QuirkMode::Legacy => m.registers[0],
        QuirkMode::Modern => vx(m, inst),
    };
    m.program_counter = inst.nnn + offset as u16;
    Ok(())
}

// CXNN
fn random(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    let byte: u8 = m.rng.gen();
    set_vx(m, inst, byte & inst.nn);
    Ok(())
}

// DXYN
fn draw(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    let (x, y) = (vx(m, inst), vy(m, inst));
    m.set_flag(false);
    let sprite: Vec<u8> = (0..inst.n as u16)
        .map(|row| m.memory.read((m.index + row) & ADDR_MASK))
        .collect();
    let collision = m.framebuffer.draw_sprite(x, y, &sprite);
    m.set_flag(collision);
    Ok(())
}

// EX9E
fn skip_if_key(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    if m.keypad.is_pressed(vx(m, inst))? {
        m.skip();
    }
    Ok(())
}

// EXA1
fn skip_unless_key(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    if !m.keypad.is_pressed(vx(m, inst))? {
        m.skip();
    }
    Ok(())
}

// FX07
fn read_delay_timer(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    set_vx(m, inst, m.timers.delay);
    Ok(())
}

// FX0A: wait for a press, then for that key's release, then commit it.
// A release is seen even if the key went straight back down before this
// instruction ran again.
fn wait_for_key(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    match m.key_wait {
        None | Some(KeyWait::Press) => {
            m.key_wait = Some(match m.keypad.first_fresh_press() {
                Some(key) => KeyWait::Release(key),
                None => KeyWait::Press,
            });
            m.repeat();
        }
        Some(KeyWait::Release(key)) => {
            if m.keypad.is_pressed(key)? && !m.keypad.was_released(key)? {
                m.repeat();
            } else {
                m.key_wait = None;
                set_vx(m, inst, key);
            }
        }
    }
    Ok(())
}

// FX15
fn set_delay_timer(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    m.timers.delay = vx(m, inst);
    Ok(())
}

// FX18
fn set_sound_timer(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    m.timers.sound = vx(m, inst);
    Ok(())
}

// FX1E: VF flags I leaving the 12-bit space
fn add_to_index(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    let sum = m.index + vx(m, inst) as u16;
    m.index = sum & ADDR_MASK;
    m.set_flag(sum > ADDR_MASK);
    Ok(())
}

// FX29
fn font_glyph(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    m.index = m.memory.glyph_addr(vx(m, inst));
    Ok(())
}

// FX33
fn binary_coded_decimal(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    let value = vx(m, inst);
    let digits = [value / 100, value / 10 % 10, value % 10];
    for (offset, digit) in digits.into_iter().enumerate() {
        m.memory.write_byte((m.index + offset as u16) & ADDR_MASK, digit);
    }
    Ok(())
}

fn advance_index_after_bulk(m: &mut MachineState, inst: Instruction) {
    if m.quirks == QuirkMode::Legacy {
        m.index = (m.index + inst.x as u16 + 1) & ADDR_MASK;
    }
}

// FX55
fn store_registers(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    for i in 0..=inst.x as u16 {
        m.memory
            .write_byte((m.index + i) & ADDR_MASK, m.registers[i as usize]);
    }
    advance_index_after_bulk(m, inst);
    Ok(())
}

// FX65
fn load_registers(m: &mut MachineState, inst: Instruction) -> Result<(), Chip8Error> {
    for i in 0..=inst.x as u16 {
        m.registers[i as usize] = m.memory.read((m.index + i) & ADDR_MASK);
    }
    advance_index_after_bulk(m, inst);
    Ok(())
}
