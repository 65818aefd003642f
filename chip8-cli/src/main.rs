//! Entrypoint for CLI
use std::{env, error::Error, fs, time::Instant};

use chip8::{prelude::*, NoKeys, IMPL_VERSION};
use log::{error, info, LevelFilter};

use self::headless::HeadlessDisplay;

mod headless;

static USAGE: &str = r#"
usage: chip8 run FILE [OPTIONS]

commands:
    run     Run the target ROM file

options:
    --frequency HZ  CPU clock frequency, 0 runs unthrottled (default 1760000)
    --steps N       Stop after N cycles
    --seed N        Seed for the random number generator
    --debug         Trace every executed instruction

examples:
    chip8 run breakout.rom
    chip8 run maze.rom --frequency 0 --steps 5000
"#;

fn run_bytecode(args: RunArgs) -> Chip8Result<()> {
    info!("load rom: {}", args.filepath);

    let bytecode = fs::read(&args.filepath)?;

    let mut vm = Chip8Vm::new(Chip8Conf {
        clock_frequency: args.frequency.map(Hz),
        rng_seed: args.seed,
    });
    vm.load_bytecode(bytecode.as_slice())?;

    let mut display = HeadlessDisplay::new();
    let mut clock = vm.clock();

    let start = Instant::now();
    let result = match args.steps {
        Some(step_count) => vm.run_steps(step_count, &mut display, &NoKeys, &mut clock),
        None => vm.run(&mut display, &NoKeys, &mut clock),
    };
    let end = Instant::now();

    info!(
        "time taken: {}ms, {} frames, {} beeps",
        end.duration_since(start).as_nanos() as f64 / 1000000.0, // to millis
        display.frames(),
        display.beeps()
    );
    println!("{}", display.dump()?);

    if let Err(ref err) = result {
        error!("{}", vm.dump_registers()?);
        error!("program halted: {err}");
    }

    result
}

fn main() -> Result<(), Box<dyn Error>> {
    let cmd = parse_args(env::args().skip(1));

    let level = match cmd {
        Some(Cmd::Run(RunArgs { debug: true, .. })) => LevelFilter::Debug,
        _ => LevelFilter::Info,
    };
    simple_logger::SimpleLogger::new()
        .with_level(level)
        .env()
        .init()?;

    match cmd {
        Some(Cmd::Run(args)) => run_bytecode(args)?,
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    }

    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Cmd> {
    match args.next()?.as_str() {
        "run" => {
            let mut run = RunArgs {
                filepath: args.next()?,
                frequency: None,
                steps: None,
                seed: None,
                debug: false,
            };

            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--frequency" => run.frequency = Some(consume_number(&mut args)?),
                    "--steps" => run.steps = Some(consume_number(&mut args)?),
                    "--seed" => run.seed = Some(consume_number(&mut args)?),
                    "--debug" => run.debug = true,
                    _ => return None,
                }
            }

            Some(Cmd::Run(run))
        }
        _ => None,
    }
}

/// Consumes the next argument as a number.
fn consume_number<T: std::str::FromStr>(args: &mut impl Iterator<Item = String>) -> Option<T> {
    args.next()?.parse().ok()
}

fn print_usage() {
    println!("Chip8 v{IMPL_VERSION}");
    println!("{USAGE}");
}

enum Cmd {
    /// Run file
    Run(RunArgs),
}

struct RunArgs {
    filepath: String,
    frequency: Option<u64>,
    steps: Option<usize>,
    seed: Option<u64>,
    debug: bool,
}
