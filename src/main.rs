use clap::{arg,crate_version,Command};
use lzwfuzz::{lzw, fuzzy};

const RCH: &str = "unreachable was reached";

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    let long_help =
"Examples:
---------
Compress:      `lzwfuzz compress -m lzw -i my_file -o my_file.Z`
Expand:        `lzwfuzz expand -m lzw -i my_file.Z -o my_file`
Hash:          `lzwfuzz hash -i some_file`
Compare:       `lzwfuzz cmp -a some_signature -b other_signature`";

    let methods = ["lzw"];

    let mut main_cmd = Command::new("lzwfuzz")
        .about("Compress/expand classic .Z files and compute ssdeep-style fuzzy hashes")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("compress")
        .arg(arg!(-m --method <METHOD> "compression algorithm").value_parser(methods)
            .required(true))
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .about("compress a file"));

    main_cmd = main_cmd.subcommand(Command::new("expand")
        .arg(arg!(-m --method <METHOD> "compression algorithm").value_parser(methods)
            .required(true))
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .about("expand a file"));

    main_cmd = main_cmd.subcommand(Command::new("hash")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .about("compute a context-triggered piecewise hash of a file"));

    main_cmd = main_cmd.subcommand(Command::new("cmp")
        .arg(arg!(-a --first <SIGNATURE> "first signature").required(true))
        .arg(arg!(-b --second <SIGNATURE> "second signature").required(true))
        .about("compare two piecewise hash signatures, 0-100"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let method = cmd.get_one::<String>("method").expect(RCH);
        let dat = std::fs::read(path_in)?;
        let compressed: Vec<u8> = match method.as_str() {
            "lzw" => lzw::compress_slice(&dat,&lzw::STD_OPTIONS)?,
            _ => {
                eprintln!("{} not supported",method);
                return Err(Box::new(std::fmt::Error));
            }
        };
        std::fs::write(path_out,compressed)?;
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let method = cmd.get_one::<String>("method").expect(RCH);
        let dat = std::fs::read(path_in)?;
        let expanded: Vec<u8> = match method.as_str() {
            "lzw" => lzw::expand_slice(&dat)?,
            _ => {
                eprintln!("{} not supported",method);
                return Err(Box::new(std::fmt::Error));
            }
        };
        std::fs::write(path_out,expanded)?;
    }

    if let Some(cmd) = matches.subcommand_matches("hash") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let dat = std::fs::read(path_in)?;
        println!("{}", fuzzy::hash_buffer(&dat)?);
    }

    if let Some(cmd) = matches.subcommand_matches("cmp") {
        let sig1 = cmd.get_one::<String>("first").expect(RCH);
        let sig2 = cmd.get_one::<String>("second").expect(RCH);
        println!("{}", fuzzy::compare(sig1,sig2)?);
    }

    Ok(())
}
