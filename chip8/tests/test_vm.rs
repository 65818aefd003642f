use std::cell::Cell;

use chip8::{constants::*, prelude::*, FixedClock, NoKeys, NullDisplay};

fn load(bytecode: &[u8]) -> Chip8Vm {
    let mut vm = Chip8Vm::new(Chip8Conf {
        clock_frequency: Some(Hz(0)),
        rng_seed: Some(42),
    });
    vm.load_bytecode(bytecode).unwrap();
    vm
}

/// Display sink that keeps the last frame it was given.
struct Screen {
    frame: Vec<bool>,
    refreshes: usize,
}

impl Screen {
    fn new() -> Self {
        Self {
            frame: vec![false; DISPLAY_BUFFER_SIZE],
            refreshes: 0,
        }
    }

    fn pixel(&self, x: usize, y: usize) -> bool {
        self.frame[x + y * DISPLAY_WIDTH]
    }
}

impl DisplaySink for Screen {
    fn refresh(&mut self, display: &[bool; DISPLAY_BUFFER_SIZE]) {
        self.frame.copy_from_slice(display);
        self.refreshes += 1;
    }

    fn beep(&mut self) {}
}

#[test]
#[rustfmt::skip]
fn test_draw_glyph_and_loop() {
    let mut vm = load(&[
        0x60, 0x00, // LD v0, 0
        0x61, 0x00, // LD v1, 0
        0xA0, 0x00, // LD I, 0x000
        0xD0, 0x15, // DRW v0, v1, 5
        0x12, 0x08, // JP 0x208
    ]);
    let mut screen = Screen::new();
    let mut clock = FixedClock::new(1.0);

    vm.run_steps(100, &mut screen, &NoKeys, &mut clock).unwrap();

    let cpu = vm.cpu();
    assert_eq!(cpu.registers()[0], 0);
    assert_eq!(cpu.registers()[1], 0);
    assert_eq!(cpu.registers()[0xF], 0);
    assert_eq!(cpu.address(), 0);
    assert_eq!(cpu.pc(), 0x208);

    // Glyph "0" in the top left corner.
    #[rustfmt::skip]
    let glyph = [
        "####",
        "#..#",
        "#..#",
        "#..#",
        "####",
    ];
    for (y, row) in glyph.iter().enumerate() {
        for (x, px) in row.chars().enumerate() {
            assert_eq!(screen.pixel(x, y), px == '#', "pixel ({x}, {y})");
        }
    }
    assert!(!screen.pixel(4, 0));
    assert!(!screen.pixel(0, 5));
    assert_eq!(screen.frame.iter().filter(|px| **px).count(), 14);

    // Cleared screen after reset, then the glyph. Looping does not redraw.
    assert_eq!(screen.refreshes, 2);
}

#[test]
#[rustfmt::skip]
fn test_draw_at_flag_register_coordinate() {
    let mut vm = load(&[
        0x6F, 0x0A, // LD vF, 10
        0x60, 0x00, // LD v0, 0
        0xA0, 0x00, // LD I, 0x000
        0xDF, 0x05, // DRW vF, v0, 5
    ]);
    let mut screen = Screen::new();

    vm.run_steps(4, &mut screen, &NoKeys, &mut FixedClock::new(0.0)).unwrap();
    assert!(!screen.pixel(0, 0));
    assert!(screen.pixel(10, 0));
    assert!(screen.pixel(13, 4));
    assert_eq!(vm.cpu().registers()[0xF], 0);
}

#[test]
#[rustfmt::skip]
fn test_double_draw_restores_display() {
    let mut vm = load(&[
        0x60, 0x3C, // LD v0, 60
        0x61, 0x1E, // LD v1, 30
        0xA2, 0x10, // LD I, .sprite
        0xD0, 0x13, // DRW v0, v1, 3
        0x62, 0x01, // LD v2, 1
        0x72, 0x01, // ADD v2, 1
        0xD0, 0x13, // DRW v0, v1, 3
        0x12, 0x0E, // JP 0x20E
        0b1010_1010, // .sprite
        0b0101_0101,
        0b1111_1111,
    ]);
    let mut screen = Screen::new();
    let mut clock = FixedClock::new(0.0);

    vm.run_steps(4, &mut screen, &NoKeys, &mut clock).unwrap();
    assert_eq!(vm.cpu().registers()[0xF], 0);
    assert!(screen.frame.iter().any(|px| *px));
    // Last row wraps around the right and bottom edges.
    assert!(screen.pixel(63, 0));
    assert!(screen.pixel(0, 0));
    assert!(screen.pixel(60, 30));
    assert!(!screen.pixel(61, 30));

    vm.run_steps(3, &mut screen, &NoKeys, &mut clock).unwrap();
    assert_eq!(vm.cpu().registers()[0xF], 1);
    assert!(screen.frame.iter().all(|px| !px));
}

#[test]
#[rustfmt::skip]
fn test_clear_then_draw_has_no_collision() {
    let mut vm = load(&[
        0xA0, 0x00, // LD I, 0x000
        0xD0, 0x05, // DRW v0, v0, 5
        0x00, 0xE0, // CLS
        0x6F, 0x07, // LD vF, 7
        0xD0, 0x05, // DRW v0, v0, 5
    ]);
    let mut screen = Screen::new();

    vm.run_steps(5, &mut screen, &NoKeys, &mut FixedClock::new(0.0)).unwrap();
    assert_eq!(vm.cpu().registers()[0xF], 0);
    assert!(screen.pixel(0, 0));
}

#[test]
#[rustfmt::skip]
fn test_subroutines() {
    let mut vm = load(&[
        0x22, 0x08, // CALL 0x208
        0x22, 0x08, // CALL 0x208
        0x12, 0x04, // JP 0x204
        0x00, 0x00, // padding
        0x70, 0x01, // ADD v0, 1   ; 0x208
        0x00, 0xEE, // RET
    ]);

    vm.run_steps(20, &mut NullDisplay, &NoKeys, &mut FixedClock::new(0.0)).unwrap();
    assert_eq!(vm.cpu().registers()[0], 2);
    assert_eq!(vm.cpu().sp(), 0);
    assert_eq!(vm.cpu().pc(), 0x204);
}

#[test]
fn test_recursion_overflows_stack() {
    // CALL 0x200, forever.
    let mut vm = load(&[0x22, 0x00]);

    let result = vm.run(&mut NullDisplay, &NoKeys, &mut FixedClock::new(0.0));
    match result {
        Err(err @ Chip8Error::StackOverflow { .. }) => {
            assert_eq!(err.to_string(), "call stack overflow: 2200 at 0200");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(vm.cpu().sp(), STACK_SIZE);
}

#[test]
fn test_unsupported_opcode_halts() {
    let mut vm = load(&[0x60, 0x01, 0xFF, 0xFF]);
    let result = vm.run(&mut NullDisplay, &NoKeys, &mut FixedClock::new(0.0));
    assert!(matches!(
        result,
        Err(Chip8Error::UnsupportedOpcode {
            pc: 0x202,
            opcode: 0xFFFF
        })
    ));
    assert!(!vm.is_running());
}

#[test]
fn test_program_too_large() {
    let mut vm = Chip8Vm::new(Chip8Conf::default());
    let program = vec![0x00; MEM_SIZE - MEM_START + 1];
    assert!(matches!(
        vm.load_bytecode(&program),
        Err(Chip8Error::ProgramTooLarge { size: 3585, capacity: 3584 })
    ));
}

#[test]
#[rustfmt::skip]
fn test_key_wait_resumes() {
    let mut vm = load(&[
        0xF3, 0x0A, // LD v3, K
        0x73, 0x01, // ADD v3, 1
        0x12, 0x04, // JP 0x204
    ]);
    let keys = Cell::new(None::<KeyCode>);
    let mut clock = FixedClock::new(0.0);

    vm.run_steps(10, &mut NullDisplay, &keys, &mut clock).unwrap();
    assert_eq!(vm.state(), VmState::AwaitingKey { register: 3 });
    assert_eq!(vm.cpu().pc(), 0x202);

    keys.set(Some(KeyCode::KeyC));
    vm.run_steps(2, &mut NullDisplay, &keys, &mut clock).unwrap();
    assert_eq!(vm.state(), VmState::Fetching);
    assert_eq!(vm.cpu().registers()[3], 0xD);
    assert_eq!(vm.cpu().pc(), 0x204);
}

#[test]
#[rustfmt::skip]
fn test_seeded_random_is_repeatable() {
    let program = [
        0xC0, 0xFF, // RND v0, 0xFF
        0xC1, 0xFF, // RND v1, 0xFF
        0xC2, 0xFF, // RND v2, 0xFF
    ];
    let mut a = load(&program);
    let mut b = load(&program);

    a.run_steps(3, &mut NullDisplay, &NoKeys, &mut FixedClock::new(0.0)).unwrap();
    b.run_steps(3, &mut NullDisplay, &NoKeys, &mut FixedClock::new(0.0)).unwrap();
    assert_eq!(a.cpu().registers(), b.cpu().registers());
}
