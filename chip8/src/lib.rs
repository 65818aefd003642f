pub mod alu;
mod bytecode;
mod clock;
pub mod constants;
mod cpu;
mod devices;
mod error;
mod interp;
mod vm;

pub use self::{
    clock::{Clock, FixedClock},
    devices::{DisplaySink, InvalidKeyCode, KeyCode, KeySource, NoKeys, NullDisplay, TickSource},
    error::{Chip8Error, Chip8Result},
    vm::{Flow, Hz, StopHandle, VmState},
};

pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use super::{
        cpu::Chip8Cpu,
        devices::{DisplaySink, KeyCode, KeySource, TickSource},
        error::{Chip8Error, Chip8Result},
        interp::Processor,
        vm::{Chip8Conf, Chip8Vm, Flow, Hz, VmState},
    };
}
