//! `mkimage` builds a bootable disk image out of a flat bootblock ELF and a
//! kernel ELF: each file's loadable segments are concatenated in program-header
//! order, zero-padded out to their `memsz`, and the kernel is further padded to
//! a whole number of 512-byte sectors. The resulting sector count is patched,
//! little-endian, at byte offset 2 of the image (inside the bootblock), where
//! the boot sector expects to find it.

use object::{Object, ObjectSegment};
use std::env;
use std::fs;
use std::io::{Seek, SeekFrom, Write};
use std::process::exit;

const SECTOR_SIZE: usize = 512;
/// Offset, within the bootblock, of the word patched with the kernel's size
/// in sectors.
const OS_SIZE_LOC: u64 = 2;
const OUTPUT_FILE: &str = "image";

/// Prints command usage.
fn print_usage(name: &str) {
    println!("Usage:");
    println!(" {} [--extended] <bootblock> <kernel>", name);
    println!();
    println!("Concatenates a bootblock and a kernel ELF image into a bootable disk image.");
    println!();
    println!("Options:");
    println!(" --extended\tprint per-segment debug information while building");
}

/// Structure representing input arguments.
struct Args {
    extended: bool,
    bootblock: String,
    kernel: String,
}

/// Parses arguments from the given array, `args[0]` being the binary name.
fn parse_args(args: &[String]) -> Option<Args> {
    let mut extended = false;
    let mut positional = Vec::new();

    for a in &args[1..] {
        match a.as_str() {
            "--extended" => extended = true,
            _ => positional.push(a.clone()),
        }
    }

    if positional.len() != 2 {
        return None;
    }
    Some(Args {
        extended,
        bootblock: positional[0].clone(),
        kernel: positional[1].clone(),
    })
}

/// One loadable segment's in-memory image: `data` is exactly `memsz` bytes,
/// the tail beyond the segment's `filesz` already zeroed.
struct Segment {
    data: Vec<u8>,
}

/// Reads `filename`'s ELF program headers and returns every `PT_LOAD`
/// segment's memory image, plus the sum of their `memsz` in bytes.
fn parse_file(filename: &str, extended: bool) -> Result<(Vec<Segment>, usize), String> {
    let bytes = fs::read(filename).map_err(|e| format!("could not read `{filename}`: {e}"))?;
    let file = object::File::parse(&*bytes).map_err(|e| format!("`{filename}` is not a valid ELF file: {e}"))?;

    let mut segments = Vec::new();
    let mut total_size = 0usize;
    for (i, seg) in file.segments().enumerate() {
        let memsz = seg.size() as usize;
        let file_data = seg
            .data()
            .map_err(|e| format!("`{filename}` segment {i}: {e}"))?;
        if extended {
            println!("{:>10} {}", "Segment:", i);
            println!("{:>20} {}", "memsz:", memsz);
            println!("{:>10} {}", "filesz:", file_data.len());
            println!("{:>20} {}", "offset:", seg.file_range().0);
            println!("{:>10} {:#x}", "vaddr:", seg.address());
        }

        let mut data = vec![0u8; memsz];
        let copy_len = file_data.len().min(memsz);
        data[..copy_len].copy_from_slice(&file_data[..copy_len]);
        total_size += memsz;
        segments.push(Segment { data });
    }
    Ok((segments, total_size))
}

fn write_segments(segments: &[Segment], f: &mut fs::File) -> std::io::Result<()> {
    for seg in segments {
        f.write_all(&seg.data)?;
    }
    Ok(())
}

fn run(args: &Args) -> Result<(), String> {
    println!("0x7c00  {}", args.bootblock);
    let (boot_segments, boot_size) = parse_file(&args.bootblock, args.extended)?;
    println!("0x8000  {}", args.kernel);
    let (kernel_segments, kernel_size) = parse_file(&args.kernel, args.extended)?;

    if boot_segments.is_empty() || kernel_segments.is_empty() || boot_size != SECTOR_SIZE {
        return Err("bootblock or kernel file is incorrect".into());
    }

    let mut f = fs::File::create(OUTPUT_FILE)
        .map_err(|e| format!("failed to create `{OUTPUT_FILE}`: {e}"))?;
    write_segments(&boot_segments, &mut f).map_err(|e| e.to_string())?;
    write_segments(&kernel_segments, &mut f).map_err(|e| e.to_string())?;

    if kernel_size % SECTOR_SIZE != 0 {
        let rem = SECTOR_SIZE - (kernel_size % SECTOR_SIZE);
        if args.extended {
            println!("padding os with: {rem} bytes");
        }
        f.write_all(&vec![0u8; rem]).map_err(|e| e.to_string())?;
    }

    let os_size = (kernel_size / SECTOR_SIZE) as u32 + (kernel_size % SECTOR_SIZE != 0) as u32;
    if args.extended {
        println!("os_size: {os_size}");
    }

    f.seek(SeekFrom::Start(OS_SIZE_LOC)).map_err(|e| e.to_string())?;
    f.write_all(&os_size.to_le_bytes()).map_err(|e| e.to_string())?;
    Ok(())
}

fn main() {
    let argv: Vec<String> = env::args().collect();
    let bin = argv.first().cloned().unwrap_or_else(|| "mkimage".into());

    let args = match parse_args(&argv) {
        Some(a) => a,
        None => {
            print_usage(&bin);
            exit(1);
        }
    };

    if let Err(e) = run(&args) {
        eprintln!("{e}");
        exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_args_rejects_wrong_positional_count() {
        let argv = vec!["mkimage".to_string(), "only_one".to_string()];
        assert!(parse_args(&argv).is_none());
    }

    #[test]
    fn parse_args_accepts_extended_flag_in_any_position() {
        let argv = vec![
            "mkimage".to_string(),
            "--extended".to_string(),
            "boot".to_string(),
            "kernel".to_string(),
        ];
        let args = parse_args(&argv).unwrap();
        assert!(args.extended);
        assert_eq!(args.bootblock, "boot");
        assert_eq!(args.kernel, "kernel");
    }
}
