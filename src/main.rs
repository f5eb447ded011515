use clap::{Arg, Command as ClapCommand, ArgAction};
use std::process;
use log::{error, LevelFilter};

use tiffcoder::utils::logger::Logger;
use tiffcoder::commands::{CommandFactory, TiffcoderCommandFactory};

fn main() {
    let matches = ClapCommand::new("tiffcoder")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Analyze TIFF/BigTIFF files and convert them between layouts and compressions")
        .arg(
            Arg::new("input")
                .help("Input TIFF file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("List every tag and log debug output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("convert")
                .short('c')
                .long("convert")
                .help("Decode the input and write it to --output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Output TIFF file")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML file with coder limits and warning policy")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("compression")
                .long("compression")
                .help("Output compression (none, lzw, zip, zstd, jpeg, rle, webp)")
                .value_name("NAME")
                .required(false),
        )
        .arg(
            Arg::new("quality")
                .long("quality")
                .help("Compression quality, 0-100")
                .value_name("N")
                .required(false),
        )
        .arg(
            Arg::new("tile")
                .long("tile")
                .help("Write tiles of WxH pixels, multiples of 16")
                .value_name("WxH")
                .required(false),
        )
        .arg(
            Arg::new("rows-per-strip")
                .long("rows-per-strip")
                .help("Rows per strip for stripped output")
                .value_name("ROWS")
                .required(false),
        )
        .arg(
            Arg::new("strip-per-page")
                .long("strip-per-page")
                .help("Write each frame as a single strip")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("predictor")
                .long("predictor")
                .help("Predictor (none, horizontal, float)")
                .value_name("NAME")
                .required(false),
        )
        .arg(
            Arg::new("depth")
                .long("depth")
                .help("Output bits per sample")
                .value_name("BITS")
                .required(false),
        )
        .arg(
            Arg::new("float")
                .long("float")
                .help("Write IEEE floating point samples")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("type")
                .long("type")
                .help("Output type (bilevel, grayscale, palette, truecolor, colorseparation, with -matte)")
                .value_name("TYPE")
                .required(false),
        )
        .arg(
            Arg::new("alpha")
                .long("alpha")
                .help("Alpha type to write (unspecified, associated, unassociated)")
                .value_name("TYPE")
                .required(false),
        )
        .arg(
            Arg::new("endian")
                .long("endian")
                .help("Output byte order (lsb, msb, native)")
                .value_name("ORDER")
                .required(false),
        )
        .arg(
            Arg::new("bigtiff")
                .long("bigtiff")
                .help("Write BigTIFF")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("pyramid")
                .long("pyramid")
                .help("Append reduced-resolution levels after each frame")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("exif")
                .long("exif")
                .help("Write EXIF and GPS directories from the input's EXIF profile")
                .value_name("BOOL")
                .value_parser(clap::value_parser!(bool))
                .required(false),
        )
        .arg(
            Arg::new("first-only")
                .long("first-only")
                .help("Write only the first frame")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("subimage")
                .long("subimage")
                .help("First frame to read")
                .value_name("N")
                .required(false),
        )
        .arg(
            Arg::new("subrange")
                .long("subrange")
                .help("Number of frames to read, 0 for all")
                .value_name("N")
                .required(false),
        )
        .arg(
            Arg::new("ignore-tags")
                .long("ignore-tags")
                .help("Tags to skip while reading, e.g. '270,33432-33434'")
                .value_name("LIST")
                .required(false),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Treat codec warnings as errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Hide progress bars")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("env-logger")
                .long("env-logger")
                .help("Log through env_logger, filtered by RUST_LOG")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Log file")
                .value_name("FILE")
                .default_value("tiffcoder.log"),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    let log_file = matches.get_one::<String>("log-file").map(String::as_str).unwrap_or("tiffcoder.log");
    let logger = match Logger::new(log_file) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error initializing logger: {}", e);
            process::exit(1);
        }
    };

    if matches.get_flag("env-logger") {
        Logger::init_env_logger(if verbose { "debug" } else { "info" });
    } else {
        let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
        if let Err(e) = Logger::init_global_logger("tiffcoder-global.log", level, true) {
            eprintln!("Error setting up global logger: {}", e);
            process::exit(1);
        }
    }

    let factory = TiffcoderCommandFactory::new();

    let command_result = factory.create_command(&matches, &logger);
    match command_result {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to create command: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
}
