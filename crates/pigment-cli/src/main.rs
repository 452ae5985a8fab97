use std::env;
use std::fs;
use std::io::Write;
use std::process::ExitCode;

use pigment_lang::{Color, Raster, Surface, compile, execute};

struct Args {
    script: String,
    width: i32,
    height: i32,
    out: Option<String>,
}

fn main() -> ExitCode {
    let argv: Vec<String> = env::args().collect();
    let args = match parse_args(&argv) {
        Ok(parsed) => parsed,
        Err(msg) => {
            eprintln!("{msg}");
            eprintln!("usage: {} <script> [width] [height] [out.ppm]", argv[0]);
            return ExitCode::FAILURE;
        }
    };

    let source = match fs::read_to_string(&args.script) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("cannot read {}: {e}", args.script);
            return ExitCode::FAILURE;
        }
    };

    let program = match compile(&source) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut raster = Raster::blank(args.width, args.height);
    match execute(&program, &mut raster) {
        Ok(output) => {
            for line in output {
                println!("{line}");
            }
        }
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    }

    if let Some(path) = &args.out {
        if let Err(e) = write_ppm(path, &raster) {
            eprintln!("cannot write {path}: {e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

fn parse_args(argv: &[String]) -> Result<Args, String> {
    let script = argv.get(1).cloned().ok_or_else(|| "missing script path".to_string())?;
    let dim = |i: usize, default: i32| -> Result<i32, String> {
        match argv.get(i) {
            Some(s) => s.parse().map_err(|_| format!("invalid dimension `{s}`")),
            None => Ok(default),
        }
    };
    let width = dim(2, 256)?;
    let height = dim(3, width)?;
    Ok(Args { script, width, height, out: argv.get(4).cloned() })
}

/// Dumps the target buffer as binary PPM (P6). Alpha is dropped.
fn write_ppm(path: &str, raster: &Raster) -> std::io::Result<()> {
    let (w, h) = (raster.target_width(), raster.target_height());
    let mut data = Vec::with_capacity(32 + (w * h * 3) as usize);
    write!(data, "P6\n{w} {h}\n255\n")?;
    for y in 0..h {
        for x in 0..w {
            let c = raster.target_pixel(x, y);
            data.push(Color::channel_byte(c.r));
            data.push(Color::channel_byte(c.g));
            data.push(Color::channel_byte(c.b));
        }
    }
    fs::write(path, data)
}
