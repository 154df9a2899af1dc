use anyhow::Context as _;
use clap::Args;
use std::{
    convert::Infallible,
    fs::File,
    io::{BufReader, BufWriter, Read, Write, stdin, stdout},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Where `solve` and `export` read the dispatch document and write their result.
#[derive(Args)]
pub struct IOArgs {
    /// The dispatch JSON document, or "-" for stdin
    #[arg(value_parser = clap::value_parser!(Stream))]
    input: Stream,

    /// Where to write the result, or "-" for stdout
    #[arg(short, long, default_value = "-", value_parser = clap::value_parser!(Stream))]
    output: Stream,
}

impl IOArgs {
    pub fn read(&self) -> anyhow::Result<Box<dyn Read>> {
        self.input.reader()
    }

    pub fn write(&self) -> anyhow::Result<Box<dyn Write>> {
        self.output.writer()
    }

    /// The extension of the output file, if output goes to a file
    pub fn extension(&self) -> Option<&str> {
        self.output.path()?.extension()?.to_str()
    }
}

/// A file, or the standard stream in the direction it is used.
#[derive(Clone, Debug, PartialEq)]
pub enum Stream {
    File(PathBuf),
    Std,
}

impl Stream {
    fn path(&self) -> Option<&Path> {
        match self {
            Stream::File(path) => Some(path),
            Stream::Std => None,
        }
    }

    pub fn reader(&self) -> anyhow::Result<Box<dyn Read>> {
        let reader: Box<dyn Read> = match self.path() {
            Some(path) => Box::new(BufReader::new(
                File::open(path).with_context(|| format!("reading {}", path.display()))?,
            )),
            None => Box::new(stdin().lock()),
        };
        Ok(reader)
    }

    pub fn writer(&self) -> anyhow::Result<Box<dyn Write>> {
        let writer: Box<dyn Write> = match self.path() {
            Some(path) => Box::new(BufWriter::new(
                File::create(path).with_context(|| format!("writing {}", path.display()))?,
            )),
            None => Box::new(stdout().lock()),
        };
        Ok(writer)
    }
}

impl FromStr for Stream {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "-" => Self::Std,
            path => Self::File(PathBuf::from(path)),
        })
    }
}
