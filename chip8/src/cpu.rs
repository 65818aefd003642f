//! CPU and memory state.
use log::info;

use crate::{
    constants::*,
    error::{Chip8Error, Chip8Result},
};

/// Core state for a chip8 interpreter.
pub struct Chip8Cpu {
    // ------------------------------------------------------------------------
    // Registers
    /// Program counter pointing to the current position in the bytecode.
    pub(crate) pc: Address,
    /// Stack pointer, indicating the next free slot in the stack.
    pub(crate) sp: usize,
    /// General purpose registers for temporary values.
    ///
    /// Register 16 (VF) is used for either the carry flag or borrow switch depending on opcode.
    pub(crate) registers: [u8; REGISTER_COUNT],
    /// (I) Pointer register used for temporarily storing an address.
    pub(crate) address: Address,
    /// (DT) Delay timer that counts down to 0.
    pub(crate) delay_timer: u8,
    /// (ST) Sound timer that counts down to 0. A beep is played when it reaches zero.
    pub(crate) sound_timer: u8,

    // ------------------------------------------------------------------------
    // Memory
    /// Main memory storage space.
    pub(crate) ram: Box<[u8; MEM_SIZE]>,
    /// Stack of return pointers used for jumping when a routine call finishes.
    pub(crate) stack: [Address; STACK_SIZE],
    /// Screen buffer that is drawn too.
    pub(crate) display: Box<[bool; DISPLAY_BUFFER_SIZE]>,
    /// Set when the display buffer changed since it was last presented.
    pub(crate) display_dirty: bool,
}

impl Default for Chip8Cpu {
    fn default() -> Self {
        let mut cpu = Self {
            pc: MEM_START as Address,
            sp: 0,
            registers: [0; REGISTER_COUNT],
            address: 0,
            delay_timer: 0,
            sound_timer: 0,

            ram: Box::new([0; MEM_SIZE]),
            stack: [0; STACK_SIZE],
            display: Box::new([false; DISPLAY_BUFFER_SIZE]),
            display_dirty: false,
        };
        cpu.reset();
        cpu
    }
}

impl Chip8Cpu {
    pub fn new() -> Self {
        Default::default()
    }

    /// Return the machine to its power-on state.
    ///
    /// The font is written to the interpreter area, and the
    /// rest of memory is erased.
    pub fn reset(&mut self) {
        self.clear_memory();

        let font_start = FONTSET_START as usize;
        self.ram[font_start..font_start + FONTSET_DATA_LENGTH].copy_from_slice(&FONTSET);

        self.registers.fill(0);
        self.pc = MEM_START as Address;
        self.sp = 0;
        self.address = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;

        self.clear_display();
    }

    /// Reset the machine and copy the program into memory at [`MEM_START`].
    ///
    /// Memory is left untouched when the program does not fit.
    pub fn load_program(&mut self, bytecode: &[u8]) -> Chip8Result<()> {
        if !check_program_size(bytecode) {
            return Err(Chip8Error::ProgramTooLarge {
                size: bytecode.len(),
                capacity: PROGRAM_CAPACITY,
            });
        }

        self.reset();
        self.ram[MEM_START..MEM_START + bytecode.len()].copy_from_slice(bytecode);
        info!("loaded program of {} bytes", bytecode.len());

        Ok(())
    }

    /// Erase the contents of the memory buffers `ram`, `stack` and `display`.
    pub(crate) fn clear_memory(&mut self) {
        self.ram.fill(0);
        self.stack.fill(0);
        self.display.fill(false);
    }

    pub fn clear_display(&mut self) {
        self.display.fill(false);
        self.display_dirty = true;
    }

    /// Toggle the pixel at the given coordinate, wrapping around both edges
    /// of the screen.
    ///
    /// Returns `true` when the pixel was erased, which is a collision.
    pub(crate) fn xor_pixel(&mut self, x: usize, y: usize) -> bool {
        let index = (x % DISPLAY_WIDTH) + (y % DISPLAY_HEIGHT) * DISPLAY_WIDTH;
        let old_px = self.display[index];
        self.display[index] = !old_px;
        self.display_dirty = true;
        old_px
    }

    /// Read and clear the display dirty flag.
    pub(crate) fn take_display_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.display_dirty, false)
    }

    /// Push a return address onto the call stack.
    ///
    /// Returns `None` when the stack is full.
    #[must_use]
    pub(crate) fn push_stack(&mut self, addr: Address) -> Option<()> {
        let slot = self.stack.get_mut(self.sp)?;
        *slot = addr;
        self.sp += 1;
        Some(())
    }

    /// Pop a return address off the call stack.
    ///
    /// Returns `None` when the stack is empty.
    #[must_use]
    pub(crate) fn pop_stack(&mut self) -> Option<Address> {
        self.sp = self.sp.checked_sub(1)?;
        Some(self.stack[self.sp])
    }

    /// Count down the delay timer.
    #[inline]
    pub fn tick_delay(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
    }

    /// Count down the sound timer.
    ///
    /// Returns `true` when the timer just reached zero, which is when the buzzer sounds.
    #[inline]
    pub fn tick_sound(&mut self) -> bool {
        if self.sound_timer > 0 {
            self.sound_timer -= 1;
            self.sound_timer == 0
        } else {
            false
        }
    }

    /// Fetch the big-endian instruction at the program counter.
    #[inline(always)]
    pub fn instr(&self) -> Option<u16> {
        crate::bytecode::opcode_at(&*self.ram, self.pc as usize)
    }
}

/// Accessors
impl Chip8Cpu {
    pub fn pc(&self) -> Address {
        self.pc
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.registers
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn ram(&self) -> &[u8; MEM_SIZE] {
        &self.ram
    }

    pub fn stack(&self) -> &[Address] {
        &self.stack[..self.sp]
    }

    pub fn display(&self) -> &[bool; DISPLAY_BUFFER_SIZE] {
        &self.display
    }

    pub fn is_display_dirty(&self) -> bool {
        self.display_dirty
    }
}

#[inline]
pub(crate) fn check_program_size(bytecode: &[u8]) -> bool {
    bytecode.len() <= PROGRAM_CAPACITY
}
