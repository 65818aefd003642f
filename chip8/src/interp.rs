//! Bytecode interpreter.
use log::{debug, log_enabled, Level};
use rand::prelude::*;

use crate::{
    alu::{self, AluResult},
    bytecode::*,
    constants::*,
    cpu::Chip8Cpu,
    devices::KeySource,
    error::{Chip8Error, Chip8Result},
    vm::Flow,
};

/// Instruction decoder and executor.
///
/// Executes exactly one instruction per call against the given machine state.
/// The caller is responsible for fetching the opcode and advancing the
/// program counter past it before execution.
pub struct Processor {
    rng: StdRng,
}

impl Processor {
    /// Create a processor with a random number generator seeded from
    /// the given value, or from system entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn execute<K>(&mut self, opcode: u16, cpu: &mut Chip8Cpu, keys: &K) -> Chip8Result<Flow>
    where
        K: KeySource + ?Sized,
    {
        let code = op_code(opcode);
        let (vx, vy, n) = op_xyn(opcode);
        let nn = op_nn(opcode);
        let nnn = op_nnn(opcode);
        let (x, y) = (vx as usize, vy as usize);

        let mut control_flow = Flow::Ok;

        match code {
            // Miscellaneous instructions identified by nn
            0x0 | 0xE | 0xF => control_flow = self.exec_misc(opcode, cpu, keys)?,
            // 1NNN (JP addr)
            //
            // Jump to address.
            0x1 => {
                op_trace_nnn("JP", cpu, opcode);

                cpu.pc = nnn;
                control_flow = Flow::Jump;
            }
            // 2NNN (CALL addr)
            //
            // Call subroutine at NNN.
            0x2 => {
                op_trace_nnn("CALL", cpu, opcode);

                if cpu.push_stack(cpu.pc).is_none() {
                    return Err(Chip8Error::StackOverflow {
                        pc: instr_addr(cpu),
                        opcode,
                    });
                }
                cpu.pc = nnn;
                control_flow = Flow::Jump;
            }
            // 3XNN (SE Vx, byte)
            //
            // Skip the next instruction if register VX equals value NN.
            0x3 => {
                op_trace_xnn("SE", cpu, opcode);

                if cpu.registers[x] == nn {
                    skip(cpu);
                }
            }
            // 4XNN (SNE Vx, byte)
            //
            // Skip the next instruction if register VX does not equal value NN.
            0x4 => {
                op_trace_xnn("SNE", cpu, opcode);

                if cpu.registers[x] != nn {
                    skip(cpu);
                }
            }
            // 5XY0 (SE Vx, Vy)
            //
            // Skip the next instruction if register VX equals value VY.
            0x5 if n == 0 => {
                op_trace_xy("SE", cpu, opcode);

                if cpu.registers[x] == cpu.registers[y] {
                    skip(cpu);
                }
            }
            // 6XNN (LD Vx, byte)
            //
            // Set register VX to value NN.
            0x6 => {
                op_trace_xnn("LD", cpu, opcode);

                cpu.registers[x] = nn;
            }
            // 7xnn (ADD Vx, byte)
            //
            // Add value NN to register VX. Carry flag is not set.
            0x7 => {
                op_trace_xnn("ADD", cpu, opcode);

                cpu.registers[x] = cpu.registers[x].wrapping_add(nn);
            }
            // Arithmetic instructions indentified by n
            0x8 => self.exec_math(opcode, cpu)?,
            // 9xy0 (SNE Vx, Vy)
            //
            // Skip next instruction if Vx != Vy.
            0x9 if n == 0 => {
                op_trace_xy("SNE", cpu, opcode);

                if cpu.registers[x] != cpu.registers[y] {
                    skip(cpu);
                }
            }
            // Annn (LD I, addr)
            //
            // Set address register I to value NNN.
            0xA => {
                op_trace_nnn("LD I", cpu, opcode);

                cpu.address = nnn;
            }
            // Bnnn (JP V0, addr)
            //
            // Jump to address NNN offset by register V0.
            // The sum can point past the end of memory, which faults on the next fetch.
            0xB => {
                op_trace_nnn("JP V0", cpu, opcode);

                cpu.pc = nnn + cpu.registers[0] as Address;
                control_flow = Flow::Jump;
            }
            // CXNN (RND Vx, byte)
            //
            // Generate random number.
            // Set register VX to the result of bitwise AND between a random number and NN.
            0xC => {
                op_trace_xnn("RND", cpu, opcode);

                cpu.registers[x] = nn & self.rng.gen::<u8>();
            }
            // Dxyn (DRW Vx, Vy, nibble)
            //
            // Draw sprite to the display buffer, at coordinate as per registers Vx and Vy.
            // Sprite is encoded as 8 pixels wide, N pixels high, stored in bits located in
            // memory pointed to by address register I.
            //
            // If the sprite is drawn outside of the display area, it is wrapped around to the other side.
            //
            // If the drawing operation erases existing pixels in the display buffer, register VF is set to
            // 1, and set to 0 if no display bits are unset. This is used for collision detection.
            0xD => {
                op_trace_xyn("DRW", cpu, opcode);

                let (pos_x, pos_y) = (cpu.registers[x], cpu.registers[y]);
                let collision = draw_sprite(cpu, pos_x, pos_y, n as usize).ok_or_else(|| {
                    Chip8Error::AddressOutOfRange {
                        pc: instr_addr(cpu),
                        opcode,
                        address: cpu.address as usize + n as usize - 1,
                    }
                })?;

                // If a pixel was erased, then a collision occurred.
                cpu.registers[FLAG_REGISTER] = collision as u8;
                control_flow = Flow::Draw;
            }
            // Unsupported operation.
            _ => {
                return Err(unsupported(cpu, opcode));
            }
        }

        Ok(control_flow)
    }

    /// Execute an arithmetic instruction
    #[inline]
    fn exec_math(&mut self, opcode: u16, cpu: &mut Chip8Cpu) -> Chip8Result<()> {
        let (vx, vy, n) = op_xyn(opcode);
        let (x, y) = (vx as usize, vy as usize);

        // The plain register transfers use VF as an ordinary operand
        // by convention, which conflicts with its use as a flag.
        if n <= 0x3 && (x == FLAG_REGISTER || y == FLAG_REGISTER) {
            return Err(Chip8Error::ReservedRegister {
                pc: instr_addr(cpu),
                opcode,
            });
        }

        let (a, b) = (cpu.registers[x], cpu.registers[y]);

        let result: AluResult = match n {
            // 8XY0 (LD Vx, Vy)
            //
            // Store the value of register VY in register VX.
            0x0 => {
                op_trace_xy("LD", cpu, opcode);
                cpu.registers[x] = b;
                return Ok(());
            }
            // 8XY1 (OR Vx, Vy)
            //
            // Performs bitwise OR on VX and VY, and stores the result in VX.
            0x1 => {
                op_trace_xy("OR", cpu, opcode);
                cpu.registers[x] = a | b;
                return Ok(());
            }
            // 8XY2 (AND Vx, Vy)
            0x2 => {
                op_trace_xy("AND", cpu, opcode);
                cpu.registers[x] = a & b;
                return Ok(());
            }
            // 8XY3 (XOR Vx, Vy)
            0x3 => {
                op_trace_xy("XOR", cpu, opcode);
                cpu.registers[x] = a ^ b;
                return Ok(());
            }
            // 8XY4 (ADD Vx, Vy)
            //
            // ADDs VX to VY, and stores the result in VX.
            // Overflow is wrapped.
            // If overflow, set VF to 1, else 0.
            0x4 => {
                op_trace_xy("ADD", cpu, opcode);
                alu::add(a, b)
            }
            // 8XY5 (SUB Vx, Vy)
            //
            // Subtracts VY from VX, and stores the result in VX.
            // VF is set to 1 when there is a borrow, set to 0 when there isn't.
            0x5 => {
                op_trace_xy("SUB", cpu, opcode);
                alu::sub(a, b)
            }
            // 8XY6 (SHR Vx)
            //
            // If the least-significant bit of Vx is 1, then VF is set to 1, otherwise 0.
            // Shift VX right by 1.
            // VY is unused.
            0x6 => {
                op_trace_xy("SHR", cpu, opcode);
                alu::shr(a)
            }
            // 8XY7 (SUBN Vx, Vy)
            //
            // Subtracts VX from VY, and stores the result in VX.
            // VF is set to 1 when VX is larger than VY, set to 0 otherwise.
            0x7 => {
                op_trace_xy("SUBN", cpu, opcode);
                alu::subn(a, b)
            }
            // 8XYE (SHL Vx)
            //
            // If the most-significant bit of Vx is 1, then VF is set to 1, otherwise 0.
            // Shift VX left by 1.
            // VY is unused.
            0xE => {
                op_trace_xy("SHL", cpu, opcode);
                alu::shl(a)
            }
            // ----------------------------------------------------------------
            // Unsupported operation.
            _ => return Err(unsupported(cpu, opcode)),
        };

        // Flag is written last, so it wins when VF is the destination.
        cpu.registers[x] = result.value;
        cpu.registers[FLAG_REGISTER] = result.flag;

        Ok(())
    }

    /// Execute a miscellaneous instruction
    #[inline]
    fn exec_misc<K>(&mut self, opcode: u16, cpu: &mut Chip8Cpu, keys: &K) -> Chip8Result<Flow>
    where
        K: KeySource + ?Sized,
    {
        let (vx, nn) = op_xnn(opcode);
        let x = vx as usize;

        let mut control_flow = Flow::Ok;

        match (op_code(opcode), nn) {
            // ----------------------------------------------------------------
            // 00E0 (CLS)
            //
            // Clear display
            (0x0, 0xE0) if vx == 0 => {
                op_trace("CLS", cpu, opcode);

                cpu.clear_display();
                control_flow = Flow::Draw;
            }
            // 00EE (RET)
            //
            // Return from a subroutine.
            // Subtract 1 from the stack pointer.
            // Set the program counter to the value at the top of the stack.
            (0x0, 0xEE) if vx == 0 => {
                op_trace("RET", cpu, opcode);

                match cpu.pop_stack() {
                    Some(addr) => cpu.pc = addr,
                    None => {
                        return Err(Chip8Error::StackUnderflow {
                            pc: instr_addr(cpu),
                            opcode,
                        })
                    }
                }
                control_flow = Flow::Jump;
            }
            // ----------------------------------------------------------------
            // Ex9E (SKP Vx)
            //
            // Skip the next instruction if the key with the value of Vx is pressed.
            (0xE, 0x9E) => {
                op_trace_x("SKP", cpu, opcode);

                if current_key(keys) == Some(cpu.registers[x]) {
                    skip(cpu);
                }
            }
            // ExA1 (SKNP Vx)
            //
            // Skip the next instruction if the key with the value of Vx is not pressed.
            (0xE, 0xA1) => {
                op_trace_x("SKNP", cpu, opcode);

                if current_key(keys) != Some(cpu.registers[x]) {
                    skip(cpu);
                }
            }
            // ----------------------------------------------------------------
            // Fx07 (LD Vx, DT)
            //
            // Set Vx = delay timer value.
            (0xF, 0x07) => {
                op_trace_xk("LD", cpu, opcode, "DT");

                cpu.registers[x] = cpu.delay_timer;
            }
            // Fx0A (LD Vx, K)
            //
            // Wait for a key press, store the value of the key in Vx.
            // All execution stops until a key is pressed. The VM owns the
            // wait, and fills in the register once a key arrives.
            (0xF, 0x0A) => {
                op_trace_xk("LD", cpu, opcode, "K");

                control_flow = Flow::KeyWait { register: vx };
            }
            // Fx15 (LD DT, Vx)
            //
            // Set delay timer = Vx.
            (0xF, 0x15) => {
                op_trace_kx("LD", cpu, opcode, "DT");

                cpu.delay_timer = cpu.registers[x];
            }
            // Fx18 (LD ST, Vx)
            //
            // Set sound timer = Vx.
            (0xF, 0x18) => {
                op_trace_kx("LD", cpu, opcode, "ST");

                cpu.sound_timer = cpu.registers[x];
            }
            // Fx1E (ADD I, Vx)
            //
            // Add Vx to I. The result is not masked to 12 bits.
            (0xF, 0x1E) => {
                op_trace_kx("ADD", cpu, opcode, "I");

                cpu.address = cpu.address.wrapping_add(cpu.registers[x] as Address);
            }
            // Fx29 (LD F, Vx)
            //
            // Set I = location of sprite for digit Vx.
            (0xF, 0x29) => {
                op_trace_kx("LD", cpu, opcode, "F");

                let digit = cpu.registers[x] as Address;
                cpu.address = FONTSET_START + digit * FONTSET_HEIGHT as Address;
            }
            // Fx33 (LD B, Vx)
            //
            // Store the binary-coded decimal representation of Vx
            // in the memory locations I, I+1, and I+2.
            #[rustfmt::skip]
            (0xF, 0x33) => {
                op_trace_kx("LD", cpu, opcode, "B");

                let addr = checked_range(cpu, opcode, 3)?;
                let value = cpu.registers[x];
                cpu.ram[addr]     = value / 100 % 10;
                cpu.ram[addr + 1] = value / 10  % 10;
                cpu.ram[addr + 2] = value       % 10;
            }
            // Fx55 (LD [I], Vx)
            //
            // Store registers V0 through Vx in memory starting at location I.
            (0xF, 0x55) => {
                op_trace_kx("LD", cpu, opcode, "[I]");

                let addr = checked_range(cpu, opcode, x + 1)?;
                cpu.ram[addr..=addr + x].copy_from_slice(&cpu.registers[0..=x]);
            }
            // Fx65 (LD Vx, [I])
            //
            // Read registers V0 through Vx from memory starting at location I.
            (0xF, 0x65) => {
                op_trace_xk("LD", cpu, opcode, "[I]");

                let addr = checked_range(cpu, opcode, x + 1)?;
                cpu.registers[0..=x].copy_from_slice(&cpu.ram[addr..=addr + x]);
            }
            // ----------------------------------------------------------------
            // Unsupported operation.
            _ => return Err(unsupported(cpu, opcode)),
        }

        Ok(control_flow)
    }
}

/// XOR the sprite at address I onto the display buffer.
///
/// Returns whether any pixel was erased, or `None` if the sprite
/// data extends past the end of memory. VF is cleared only once the
/// sprite is known to be readable.
fn draw_sprite(cpu: &mut Chip8Cpu, pos_x: u8, pos_y: u8, rows: usize) -> Option<bool> {
    let start = cpu.address as usize;
    if rows > 0 && start + rows > MEM_SIZE {
        return None;
    }

    cpu.registers[FLAG_REGISTER] = 0;

    let (x, y) = (pos_x as usize, pos_y as usize);
    let mut is_erased = false;

    for r in 0..rows {
        // Each row is 8 bits representing the 8 pixels of the sprite.
        let row = cpu.ram[start + r];
        for c in 0..SPRITE_WIDTH {
            if (row >> (7 - c)) & 1 != 0 {
                // XOR erases a pixel when both the old and new values are both 1.
                is_erased |= cpu.xor_pixel(x + c, y + r);
            }
        }
    }

    Some(is_erased)
}

/// Skip the next instruction.
#[inline(always)]
fn skip(cpu: &mut Chip8Cpu) {
    cpu.pc = cpu.pc.wrapping_add(2);
}

#[inline(always)]
fn current_key<K: KeySource + ?Sized>(keys: &K) -> Option<u8> {
    keys.current_key().map(u8::from)
}

/// Address of the instruction currently executing.
///
/// The program counter has already moved past it.
#[inline(always)]
fn instr_addr(cpu: &Chip8Cpu) -> Address {
    cpu.pc.wrapping_sub(2)
}

fn unsupported(cpu: &Chip8Cpu, opcode: u16) -> Chip8Error {
    Chip8Error::UnsupportedOpcode {
        pc: instr_addr(cpu),
        opcode,
    }
}

/// Check that `len` bytes starting at I fit in memory, returning I as an index.
fn checked_range(cpu: &Chip8Cpu, opcode: u16, len: usize) -> Chip8Result<usize> {
    let addr = cpu.address as usize;
    if addr + len > MEM_SIZE {
        Err(Chip8Error::AddressOutOfRange {
            pc: instr_addr(cpu),
            opcode,
            address: addr + len - 1,
        })
    } else {
        Ok(addr)
    }
}

#[inline]
fn op_trace(name: &str, cpu: &Chip8Cpu, _opcode: u16) {
    debug!("{:04X}: {:4}", instr_addr(cpu), name);
}

#[inline]
fn op_trace_nnn(name: &str, cpu: &Chip8Cpu, opcode: u16) {
    debug!("{:04X}: {:4} {:03X}", instr_addr(cpu), name, op_nnn(opcode));
}

#[inline]
fn op_trace_x(name: &str, cpu: &Chip8Cpu, opcode: u16) {
    debug!("{:04X}: {:4} V{:X}", instr_addr(cpu), name, op_x(opcode));
}

#[inline]
fn op_trace_xnn(name: &str, cpu: &Chip8Cpu, opcode: u16) {
    let (vx, nn) = op_xnn(opcode);
    debug!("{:04X}: {:4} V{:X} {:02X}", instr_addr(cpu), name, vx, nn);
}

#[inline]
fn op_trace_xyn(name: &str, cpu: &Chip8Cpu, opcode: u16) {
    let (vx, vy, n) = op_xyn(opcode);
    debug!(
        "{:04X}: {:4} V{:X} V{:X} {:01X}",
        instr_addr(cpu),
        name,
        vx,
        vy,
        n
    );
}

#[inline]
fn op_trace_xy(name: &str, cpu: &Chip8Cpu, opcode: u16) {
    if log_enabled!(Level::Debug) {
        let (vx, vy, _) = op_xyn(opcode);
        debug!("{:04X}: {:4} V{:X} V{:X}", instr_addr(cpu), name, vx, vy);
    }
}

#[inline]
fn op_trace_xk(name: &str, cpu: &Chip8Cpu, opcode: u16, k: &str) {
    debug!("{:04X}: {:4} V{:X} {}", instr_addr(cpu), name, op_x(opcode), k);
}

#[inline]
fn op_trace_kx(name: &str, cpu: &Chip8Cpu, opcode: u16, k: &str) {
    debug!("{:04X}: {:4} {} V{:X}", instr_addr(cpu), name, k, op_x(opcode));
}
