//! Virtual machine.
use std::{
    fmt::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use log::{debug, error, info};

use crate::{
    clock::Clock,
    constants::*,
    cpu::Chip8Cpu,
    devices::{DisplaySink, KeySource, TickSource},
    error::{Chip8Error, Chip8Result},
    interp::Processor,
};

pub struct Chip8Vm {
    cpu: Chip8Cpu,
    processor: Processor,
    state: VmState,
    /// Milliseconds accumulated towards the next timer count down.
    timer_acc: f64,
    /// Set while `run` or `run_steps` is looping.
    running: bool,
    /// Pending stop request, consumed by the run loop.
    stop_requested: Arc<AtomicBool>,
    conf: Chip8Conf,
}

impl Chip8Vm {
    pub fn new(conf: Chip8Conf) -> Self {
        Chip8Vm {
            cpu: Chip8Cpu::new(),
            processor: Processor::new(conf.rng_seed),
            state: VmState::Fetching,
            timer_acc: 0.0,
            running: false,
            stop_requested: Arc::new(AtomicBool::new(false)),
            conf,
        }
    }

    /// Configuration that was used to instantiate the VM.
    pub fn config(&self) -> &Chip8Conf {
        &self.conf
    }

    /// Wall clock paced to the configured CPU frequency.
    pub fn clock(&self) -> Clock {
        Clock::new(self.conf.clock_frequency())
    }

    pub fn load_bytecode(&mut self, bytecode: &[u8]) -> Chip8Result<()> {
        // Start with clean memory to avoid leaking previous program.
        self.cpu.load_program(bytecode)?;

        self.reset_control();

        Ok(())
    }

    /// Return the machine to its power-on state, erasing the loaded program.
    pub fn reset(&mut self) {
        info!("reset");
        self.cpu.reset();
        self.reset_control();
    }

    /// Clear internal state in preparation for a fresh startup.
    fn reset_control(&mut self) {
        self.state = VmState::Fetching;
        self.timer_acc = 0.0;
    }

    pub fn cpu(&self) -> &Chip8Cpu {
        &self.cpu
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    pub fn display_buffer(&self) -> &[bool; DISPLAY_BUFFER_SIZE] {
        self.cpu.display()
    }
}

/// Execution state of the fetch-execute loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    /// Instructions are fetched and executed each cycle.
    Fetching,
    /// Execution is suspended by `Fx0A` (`LD Vx, K`) until the key
    /// source reports a key, which is then stored in the register.
    AwaitingKey { register: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Ok,
    /// Program counter has jumped to a new address.
    ///
    /// This is useful for the caller to avoid being
    /// blocked on infinite or long running loops.
    ///
    /// This is returned when the interpreter encounters:
    ///
    /// - 1nnn (`JP addr`)
    /// - 2nnn (`CALL addr`)
    /// - 00EE (`RET`)
    /// - Bnnn (`JP V0, addr`)
    Jump,
    Draw,
    /// Wait for a keypress.
    ///
    /// This is triggered by the opcode `Fx0A` (`LD Vx, K`), which stops
    /// execution until a key is pressed, and loads the key value into `Vx`.
    KeyWait { register: u8 },
}

/// VM Configuration Parameters.
#[derive(Debug, Default, Clone)]
pub struct Chip8Conf {
    /// CPU clock frequency. Defaults to [`DEFAULT_CLOCK_FREQUENCY`].
    pub clock_frequency: Option<Hz>,
    /// Seed for the random number generator used by `Cxnn` (`RND Vx, byte`).
    pub rng_seed: Option<u64>,
}

impl Chip8Conf {
    pub fn clock_frequency(&self) -> Hz {
        self.clock_frequency
            .unwrap_or(Hz(DEFAULT_CLOCK_FREQUENCY))
    }
}

/// CPU clock frequency, in hertz (per second)
///
/// Zero means the CPU runs as fast as the host allows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Hz(pub u64);

impl From<Hz> for Duration {
    fn from(freq: Hz) -> Self {
        if freq.0 == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(NANOS_IN_SECOND / freq.0)
        }
    }
}

/// Handle for stopping a running VM from the outside, for example
/// from a display sink or another thread.
///
/// A stop requested while no loop is running is kept, and the next
/// call to `run` or `run_steps` returns without executing a cycle.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Interpreter
impl Chip8Vm {
    /// Signal the run loop to exit before its next cycle.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::Relaxed);
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.stop_requested.clone())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Consume a pending stop request.
    fn take_stop_request(&self) -> bool {
        self.stop_requested.swap(false, Ordering::Relaxed)
    }

    /// Run cycles until stopped, or until the program faults.
    pub fn run<D, K, T>(&mut self, display: &mut D, keys: &K, clock: &mut T) -> Chip8Result<()>
    where
        D: DisplaySink + ?Sized,
        K: KeySource + ?Sized,
        T: TickSource + ?Sized,
    {
        self.running = true;

        while !self.take_stop_request() {
            if let Err(err) = self.cycle(display, keys, clock) {
                self.running = false;
                return Err(err);
            }
        }

        self.running = false;

        Ok(())
    }

    /// Run at most the given number of cycles.
    ///
    /// Returns early when stopped.
    pub fn run_steps<D, K, T>(
        &mut self,
        step_count: usize,
        display: &mut D,
        keys: &K,
        clock: &mut T,
    ) -> Chip8Result<()>
    where
        D: DisplaySink + ?Sized,
        K: KeySource + ?Sized,
        T: TickSource + ?Sized,
    {
        self.running = true;

        for _ in 0..step_count {
            if self.take_stop_request() {
                break;
            }
            if let Err(err) = self.cycle(display, keys, clock) {
                self.running = false;
                return Err(err);
            }
        }

        self.running = false;

        Ok(())
    }

    /// Execute a single cycle.
    ///
    /// While fetching, one instruction is executed and a changed display is
    /// presented. While waiting for a key, the key source is polled instead.
    /// Either way the timers are advanced by the time the clock reports.
    pub fn cycle<D, K, T>(&mut self, display: &mut D, keys: &K, clock: &mut T) -> Chip8Result<Flow>
    where
        D: DisplaySink + ?Sized,
        K: KeySource + ?Sized,
        T: TickSource + ?Sized,
    {
        let control_flow = match self.state {
            VmState::AwaitingKey { register } => match keys.current_key() {
                Some(key) => {
                    debug!("key {key} into V{register:X}");
                    self.cpu.registers[register as usize] = key.into();
                    self.state = VmState::Fetching;
                    Flow::Ok
                }
                None => Flow::KeyWait { register },
            },
            VmState::Fetching => match self.step(keys) {
                Ok(control_flow) => {
                    if self.cpu.take_display_dirty() {
                        display.refresh(self.cpu.display());
                    }
                    control_flow
                }
                Err(err) => {
                    error!("{err}");
                    self.running = false;
                    return Err(err);
                }
            },
        };

        let elapsed = clock.tick();
        self.advance_timers(display, elapsed);

        Ok(control_flow)
    }

    /// Fetch and execute the instruction at the program counter.
    fn step<K>(&mut self, keys: &K) -> Chip8Result<Flow>
    where
        K: KeySource + ?Sized,
    {
        let pc = self.cpu.pc;
        let opcode = self
            .cpu
            .instr()
            .ok_or(Chip8Error::PcOutOfRange { pc })?;

        self.cpu.pc = pc.wrapping_add(2);

        let control_flow = self.processor.execute(opcode, &mut self.cpu, keys)?;

        if let Flow::KeyWait { register } = control_flow {
            self.state = VmState::AwaitingKey { register };
        }

        Ok(control_flow)
    }

    /// Count down the delay and sound timers at 60Hz.
    fn advance_timers<D>(&mut self, display: &mut D, elapsed: f64)
    where
        D: DisplaySink + ?Sized,
    {
        self.timer_acc += elapsed;

        if self.timer_acc > TIMER_PERIOD_MILLIS {
            self.cpu.tick_delay();

            // Buzzer sounds when the sound timer runs out.
            if self.cpu.tick_sound() {
                debug!("beep");
                display.beep();
            }

            // Reset back to zero, rather than trying to catch up.
            self.timer_acc = 0.0;
        }
    }
}

/// Troubleshooting
#[doc(hidden)]
impl Chip8Vm {
    /// Returns the contents of the memory as a human readable string.
    pub fn dump_ram(&self, count: usize) -> Result<String, std::fmt::Error> {
        let ram = self.cpu.ram();
        let end = (MEM_START + count).min(MEM_SIZE);
        let mut buf = String::new();

        for (i, op) in ram[MEM_START..end].chunks(2).enumerate() {
            let offset = MEM_START + i * 2;
            match op {
                [a, b] => writeln!(buf, "{offset:04X}: {a:02X}{b:02X}")?,
                [a] => writeln!(buf, "{offset:04X}: {a:02X}")?,
                _ => {}
            }
        }

        Ok(buf)
    }

    pub fn dump_display(&self) -> Result<String, std::fmt::Error> {
        let mut buf = String::new();

        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                if self.cpu.display()[x + y * DISPLAY_WIDTH] {
                    write!(buf, "#")?;
                } else {
                    write!(buf, ".")?;
                }
            }
            writeln!(buf)?;
        }

        Ok(buf)
    }

    pub fn dump_registers(&self) -> Result<String, fmt::Error> {
        let cpu = &self.cpu;
        let mut buf = String::new();

        write!(
            buf,
            "PC={:04X} I={:04X} SP={:X} DT={:02X} ST={:02X}",
            cpu.pc(),
            cpu.address(),
            cpu.sp(),
            cpu.delay_timer(),
            cpu.sound_timer()
        )?;
        for (i, v) in cpu.registers().iter().enumerate() {
            write!(buf, " V{i:X}={v:02X}")?;
        }

        Ok(buf)
    }
}
