use chrono::{DateTime, Local};
use colored::*;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::{error::Error, fmt};

use crate::{
    disk::SECTOR_SIZE,
    fs::{
        bitmap::BitState,
        inode::Inode,
        open_file::{FileRecord, RecordKind},
        FileSystem, FormatParams,
    },
    shell::Volume,
    utils::hex_dump,
};

#[derive(Debug)]
pub enum Command {
    Help,
    Info,
    Format,
    ReadBlock(u32),
    WriteBlock(u32, String),
    Inode(u32),
    SaveInode(u32, Vec<(String, u32)>),
    FreeInode,
    Open(String, u32, RecordKind),
    Close(usize),
    Seek(usize, u64),
    Files,
    Exit,
}

#[derive(Debug)]
struct ShellError(String);

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for ShellError {}

/// 交互会话：当前挂载的文件系统及格式化参数
pub struct Session {
    fs: Option<Volume>,
    params: FormatParams,
    started: DateTime<Local>,
}

impl Session {
    pub fn new(fs: Volume, params: FormatParams) -> Self {
        Self {
            fs: Some(fs),
            params,
            started: Local::now(),
        }
    }

    fn fs(&mut self) -> Result<&mut Volume, ShellError> {
        match self.fs.as_mut() {
            Some(fs) if fs.is_mounted() => Ok(fs),
            _ => Err(ShellError("file system not mounted, run 'format'".to_string())),
        }
    }
}

pub fn execute_command(cmd: &Command, session: &mut Session) -> Result<(), Box<dyn Error>> {
    match cmd {
        Command::Help => print_help(),
        Command::Info => print_info(session)?,
        Command::Format => format_disk(session)?,
        Command::ReadBlock(sector) => {
            let fs = session.fs()?;
            let mut data = vec![0u8; fs.geometry()?.block_bytes()];
            fs.read_block(*sector, &mut data)?;
            println!("📖 Block at sector {}", sector.to_string().cyan());
            println!("{}", hex_dump(&data, *sector as usize * SECTOR_SIZE));
        }
        Command::WriteBlock(sector, text) => {
            let fs = session.fs()?;
            fs.write_block(*sector, text.as_bytes())?;
            println!(
                "✏️  Wrote {} bytes to block at sector {}",
                text.len(),
                sector.to_string().cyan()
            );
        }
        Command::Inode(id) => {
            let fs = session.fs()?;
            let geometry = *fs.geometry()?;
            let record = fs.get_inode(*id)?;
            let inode = Inode::from_record(&record)?;
            println!(
                "{} {} (sector {}, slot {})",
                "📊 Inode".bright_yellow().bold(),
                id,
                geometry.sector_for_inode(*id),
                geometry.offset_for_inode(*id)
            );
            print_inode(&inode);
            println!("{}", hex_dump(&record, 0).bright_black());
        }
        Command::SaveInode(id, fields) => {
            let fs = session.fs()?;
            let mut inode = fs.read_inode(*id)?;
            for (name, value) in fields {
                if !inode.set_field(name, *value) {
                    return Err(Box::new(ShellError(format!("unknown inode field '{}'", name))));
                }
            }
            fs.write_inode(*id, &inode)?;
            println!("✅ Inode {} saved", id.to_string().green());
        }
        Command::FreeInode => {
            let fs = session.fs()?;
            let bitmaps = fs.load_bitmaps()?;
            let id = fs.get_free_node(&bitmaps)?;
            println!("🆓 First free inode: {}", id.to_string().green());
        }
        Command::Open(name, inode, kind) => {
            let fs = session.fs()?;
            let record = FileRecord {
                kind: *kind,
                name: name.clone(),
                inode: *inode,
            };
            let handle = fs.add_open_file(record)?;
            println!("📂 {} opened as handle {}", name.cyan(), handle.to_string().green());
        }
        Command::Close(handle) => {
            let record = session.fs()?.close_file(*handle)?;
            println!("📁 Handle {} ({}) closed", handle, record.name.cyan());
        }
        Command::Seek(handle, position) => {
            let fs = session.fs()?;
            fs.open_files_mut().get_mut(*handle)?.cursor = *position;
            let file = fs.open_files().get(*handle)?;
            println!(
                "🔖 {} (handle {}) now at {}",
                file.record.name.cyan(),
                handle,
                position.to_string().cyan()
            );
        }
        Command::Files => {
            let fs = session.fs()?;
            if fs.open_files().is_empty() {
                println!("{}", "(no open files)".bright_black());
            }
            for (handle, file) in fs.open_files().iter() {
                let kind = match file.record.kind {
                    RecordKind::Regular => "📄",
                    RecordKind::Directory => "📁",
                };
                println!(
                    "{:>3}  {} {:<20} inode {:<6} cursor {}",
                    handle, kind, file.record.name, file.record.inode, file.cursor
                );
            }
        }
        Command::Exit => println!("{}", "👋 Exiting T2FS shell...".yellow().bold()),
    }

    Ok(())
}

fn print_info(session: &mut Session) -> Result<(), Box<dyn Error>> {
    let started = session.started;
    let fs = session.fs()?;
    let sb = fs.super_block()?.clone();
    let geometry = *fs.geometry()?;
    let bitmaps = fs.load_bitmaps()?;

    println!("{}", "💽 T2FS volume".bright_yellow().bold());
    println!(
        "{}: {}  {}: {:#06x}  {}: {}",
        "Id".blue(),
        String::from_utf8_lossy(&sb.id),
        "Version".blue(),
        sb.version,
        "Checksum".blue(),
        if sb.checksum_valid() { "ok".green() } else { "mismatch".red() }
    );
    println!(
        "{}: {} blocks × {} sectors × {} bytes ({} sectors on device)",
        "Size".blue(),
        sb.disk_size,
        geometry.sectors_per_block,
        SECTOR_SIZE,
        fs.device().total_sectors()
    );
    println!(
        "{}: block bitmap {} blk, inode bitmap {} blk, inode area {} blk",
        "Layout".blue(),
        geometry.free_blocks_bitmap_size,
        geometry.free_inode_bitmap_size,
        sb.inode_area_size
    );
    println!(
        "{}: starts at sector {}, {} inodes per sector",
        "Inode table".blue(),
        geometry.inode_table_start_sector,
        geometry.inodes_per_sector
    );
    println!(
        "{}: {} / {} blocks, {} / {} inodes",
        "Free".blue(),
        bitmaps.blocks.count(BitState::Free),
        bitmaps.blocks.total,
        bitmaps.inodes.count(BitState::Free),
        bitmaps.inodes.total
    );
    println!(
        "{}: {}",
        "Session".blue(),
        started.format("%Y-%m-%d %H:%M:%S")
    );
    Ok(())
}

fn print_inode(inode: &Inode) {
    if inode.is_unused() {
        println!("{}", "(not referenced by any directory entry)".bright_black());
    }
    println!(
        "{}: {}  {}: {} bytes  {}: {}",
        "Blocks".blue(),
        inode.blocks_file_size,
        "Size".blue(),
        inode.bytes_file_size,
        "Refs".blue(),
        inode.ref_counter
    );
    println!(
        "{}: {:?}  {}: {}  {}: {}",
        "Direct".blue(),
        inode.data_ptr,
        "Single".blue(),
        inode.single_ind_ptr,
        "Double".blue(),
        inode.double_ind_ptr
    );
}

/// 重新格式化磁盘：旧的文件系统实例被丢弃，格式化后重新挂载
fn format_disk(session: &mut Session) -> Result<(), Box<dyn Error>> {
    let confirmed = Confirm::new()
        .with_prompt("Erase the whole disk?")
        .default(false)
        .interact()?;
    if !confirmed {
        println!("{}", "Format cancelled".bright_black());
        return Ok(());
    }

    let Some(old) = session.fs.take() else {
        return Err(Box::new(ShellError("no disk attached".to_string())));
    };
    let disk = old.into_device();

    println!("💾 Formatting virtual disk...");
    let pb = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::with_template("[{bar:40.green/black}] {pos:>3}% {msg}") {
        pb.set_style(style.progress_chars("#>-"));
    }
    let formatted = FileSystem::format(&disk, session.params, |done, total| {
        pb.set_position((100 * done / total.max(1)) as u64);
    });

    let mut fs = FileSystem::new(disk);
    let result = formatted.and_then(|_| fs.ensure_geometry_loaded().map(|_| ()));
    session.fs = Some(fs);

    match result {
        Ok(()) => {
            pb.finish_with_message("✅ Disk formatted successfully!");
            Ok(())
        }
        Err(e) => {
            pb.abandon_with_message("❌ Format failed");
            Err(Box::new(e))
        }
    }
}

fn print_help() {
    println!("{}", "📘 T2FS Commands".bright_cyan().bold());
    println!(
        "{}",
        "
  info                       Show superblock, geometry and free space
  format                     Re-create an empty file system
  readblock <sector>         Dump the block starting at <sector>
  writeblock <sector> <str>  Write <str> into the block, zero padded
  inode <id>                 Show one inode record
  saveinode <id> <f=v>...    Update inode fields (blocks, bytes, ptr0, ptr1,
                             single, double, refs)
  freeinode                  Show the first free inode
  open <name> <inode>        Add a file to the open file table
  opendir <name> <inode>     Same, for a directory
  close <handle>             Release a handle
  seek <handle> <pos>        Move the cursor of an open file
  files                      List open files
  help                       Show this help message
  exit                       Quit the shell
"
        .bright_black()
    );
}

