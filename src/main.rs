/*
 * SPDX-License-Identifier: Apache-2.0
 *
 * Copyright The Asahi Linux Contributors
 */

use binho_i2c::{
    parse_number,
    transport::{serial::SerialSdk, PullUpState},
    BinhoI2c, BusConfig, Error, I2cDriver, Result,
};
use clap::ArgMatches;
use env_logger::Env;
use log::{error, info};
use std::process::ExitCode;

fn byte_arg(matches: &ArgMatches, name: &str) -> Result<u8> {
    let val = number_arg(matches, name)?;
    u8::try_from(val).map_err(|_| Error::InvalidArgument(format!("{name} out of range: {val}")))
}

fn word_arg(matches: &ArgMatches, name: &str) -> Result<u16> {
    let val = number_arg(matches, name)?;
    u16::try_from(val).map_err(|_| Error::InvalidArgument(format!("{name} out of range: {val}")))
}

fn number_arg(matches: &ArgMatches, name: &str) -> Result<u32> {
    let s = matches
        .get_one::<String>(name)
        .ok_or_else(|| Error::InvalidArgument(format!("missing {name}")))?;
    parse_number(s)
}

fn register_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(clap::arg!(<ADDRESS> "7-bit i2c address of the target device."))
        .arg(clap::arg!(<COMMAND> "register or command code."))
}

fn binho_i2c() -> Result<()> {
    let matches = clap::command!()
        .arg(
            clap::arg!(-c --clock [HZ] "i2c clock rate in Hz.")
                .default_value("400000"),
        )
        .arg(clap::arg!(--"no-pullups" "leave the adapter's i2c pull-up resistors off."))
        .subcommand(clap::Command::new("scan").about("list devices that acknowledge their address"))
        .subcommand(register_args(clap::Command::new("read-byte").about("read one byte")))
        .subcommand(register_args(clap::Command::new("read-word").about("read a 16-bit word")))
        .subcommand(
            register_args(clap::Command::new("read-block").about("read COUNT bytes"))
                .arg(clap::arg!(<COUNT> "number of bytes to read.")),
        )
        .subcommand(register_args(
            clap::Command::new("write-command").about("send a bare command code"),
        ))
        .subcommand(
            register_args(clap::Command::new("write-byte").about("write one byte"))
                .arg(clap::arg!(<VALUE> "byte to write.")),
        )
        .subcommand(
            register_args(clap::Command::new("write-word").about("write a 16-bit word"))
                .arg(clap::arg!(<VALUE> "word to write, sent high byte first.")),
        )
        .subcommand(
            register_args(clap::Command::new("write-block").about("write a run of bytes"))
                .arg(clap::arg!(<VALUES> ... "bytes to write, in order.")),
        )
        .arg_required_else_help(true)
        .get_matches();

    let pull_ups = if matches.get_flag("no-pullups") {
        PullUpState::Disabled
    } else {
        PullUpState::Enabled
    };
    let config = BusConfig {
        clock_hz: number_arg(&matches, "clock")?,
        pull_ups,
        ..BusConfig::default()
    };
    let mut i2c = BinhoI2c::with_config(SerialSdk, config);
    info!(
        "i2c clock {} Hz, pull-ups {}",
        i2c.config().clock_hz,
        i2c.config().pull_ups
    );

    match matches.subcommand() {
        Some(("scan", _)) => {
            if i2c.bus().is_none() {
                return Err(Error::BusUnavailable);
            }
            let found = i2c.scan()?;
            info!("{} device(s) found", found.len());
            for address in found {
                println!("{address:#04x}");
            }
        }
        Some(("read-byte", args)) => {
            let val = i2c.read_byte(byte_arg(args, "ADDRESS")?, byte_arg(args, "COMMAND")?)?;
            println!("{val:#04x}");
        }
        Some(("read-word", args)) => {
            let val = i2c.read_word(byte_arg(args, "ADDRESS")?, byte_arg(args, "COMMAND")?)?;
            println!("{val:#06x}");
        }
        Some(("read-block", args)) => {
            let count = number_arg(args, "COUNT")? as usize;
            let data =
                i2c.read_block(byte_arg(args, "ADDRESS")?, byte_arg(args, "COMMAND")?, count)?;
            println!("{data:02x?}");
        }
        Some(("write-command", args)) => {
            i2c.write_command(byte_arg(args, "ADDRESS")?, byte_arg(args, "COMMAND")?)?;
        }
        Some(("write-byte", args)) => {
            i2c.write_byte(
                byte_arg(args, "ADDRESS")?,
                byte_arg(args, "COMMAND")?,
                byte_arg(args, "VALUE")?,
            )?;
        }
        Some(("write-word", args)) => {
            i2c.write_word(
                byte_arg(args, "ADDRESS")?,
                byte_arg(args, "COMMAND")?,
                word_arg(args, "VALUE")?,
            )?;
        }
        Some(("write-block", args)) => {
            let values = args
                .get_many::<String>("VALUES")
                .into_iter()
                .flatten()
                .map(|s| {
                    let val = parse_number(s)?;
                    u8::try_from(val)
                        .map_err(|_| Error::InvalidArgument(format!("not a byte: {s}")))
                })
                .collect::<Result<Vec<u8>>>()?;
            i2c.write_block(
                byte_arg(args, "ADDRESS")?,
                byte_arg(args, "COMMAND")?,
                values.into(),
            )?;
        }
        _ => {}
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match binho_i2c() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("binho-i2c: {e}");
            ExitCode::FAILURE
        }
    }
}
