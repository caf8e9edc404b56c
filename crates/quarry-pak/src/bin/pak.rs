//! `pak` - pack, browse and unpack Quarry archives.

use std::path::{Component, Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use quarry_pak::{Pak, PakError, PakWriter};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "pak", version, about = "Pack, browse and unpack Quarry archives")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging (`RUST_LOG` overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pack files and directories into an archive
    Pack {
        /// Files or directories to add.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Output archive.
        #[arg(short, long, default_value = "data.pak")]
        output: PathBuf,
        /// Encrypt the entry table with this key.
        #[arg(short, long)]
        encrypt: Option<String>,
        /// Encrypt file contents too.
        #[arg(long, requires = "encrypt")]
        full_encrypt: bool,
        /// Store payloads uncompressed.
        #[arg(long)]
        no_compress: bool,
        /// Do not descend into subdirectories.
        #[arg(long)]
        no_subdir: bool,
        /// Name entries by their path relative to the input directory.
        #[arg(long)]
        full_path: bool,
    },
    /// List the entries of an archive
    Browse {
        pak: PathBuf,
        /// Decryption key.
        #[arg(short, long)]
        key: Option<String>,
    },
    /// Extract every entry of an archive
    Unpack {
        pak: PathBuf,
        /// Output directory.
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        /// Decryption key.
        #[arg(short, long)]
        key: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.verbose {
        quarry_core::logging::init();
    } else {
        quarry_core::logging::init_with_filter("warn");
    }

    let result = match cli.command {
        Command::Pack {
            inputs,
            output,
            encrypt,
            full_encrypt,
            no_compress,
            no_subdir,
            full_path,
        } => {
            let mut writer = PakWriter::new();
            writer.set_compress(!no_compress);
            if let Some(key) = encrypt {
                writer.encrypt(key, full_encrypt);
            }
            for input in &inputs {
                collect(&mut writer, input, !no_subdir, full_path);
            }
            writer.write(&output).map(|stats| {
                println!(
                    "Packed {} files into '{}' ({} -> {} bytes)",
                    stats.files,
                    output.display(),
                    stats.total_size,
                    stats.stored_size
                );
            })
        }
        Command::Browse { pak, key } => browse(&pak, key.as_deref()),
        Command::Unpack { pak, output, key } => unpack(&pak, &output, key.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("pak: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn collect(writer: &mut PakWriter, input: &Path, subdir: bool, full_path: bool) {
    if input.is_file() {
        writer.add_file(input);
        return;
    }

    let walker = WalkDir::new(input).sort_by_file_name();
    let walker = if subdir { walker } else { walker.max_depth(1) };
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("Skipping unreadable entry: {}", err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let name = if full_path {
            path.strip_prefix(input)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/")
        } else {
            entry.file_name().to_string_lossy().into_owned()
        };
        tracing::debug!("Adding '{}' as '{}'", path.display(), name);
        writer.add_file_as(path, name);
    }
}

fn browse(path: &Path, key: Option<&str>) -> Result<(), PakError> {
    let pak = Pak::open(path, key)?;
    println!(
        "{} (version {}, {} files, flags {:?})",
        path.display(),
        pak.version(),
        pak.len(),
        pak.flags()
    );
    for entry in pak.entries() {
        println!(
            "  {:<40} {:>10} {:>10} @{}",
            entry.name, entry.size, entry.stored_size, entry.data_offset
        );
    }
    Ok(())
}

fn unpack(path: &Path, output: &Path, key: Option<&str>) -> Result<(), PakError> {
    let mut pak = Pak::open(path, key)?;
    for index in 0..pak.len() {
        let name = pak.entries()[index].name.clone();
        let relative = Path::new(&name);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(PakError::InvalidName { name });
        }

        let bytes = pak.read_entry(index)?;
        let target = output.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PakError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&target, bytes).map_err(|source| PakError::Io {
            path: target.clone(),
            source,
        })?;
    }
    println!("Unpacked {} files into '{}'", pak.len(), output.display());
    Ok(())
}
