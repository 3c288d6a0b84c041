use std::sync::mpsc::Sender;

use log::{error, info};

use crate::{
    cli::Cli,
    disk::{FileDisk, MemDisk, SectorDevice},
    fs::FileSystem,
    shell::BootProgress,
};

/// 打开磁盘（镜像文件或内存盘），新盘先格式化，最后挂载；进度通过 `tx` 汇报
pub fn perform_disk_initialization(cli: Cli, tx: Sender<BootProgress>) {
    // 接收端提前退出时进度消息直接丢弃
    let send = |msg: BootProgress| {
        let _ = tx.send(msg);
    };

    send(BootProgress::Step("🧠 Opening virtual disk..."));

    let (disk, created) = if cli.memory {
        let disk: Box<dyn SectorDevice> = Box::new(MemDisk::new(cli.sectors));
        (disk, true)
    } else {
        match FileDisk::open(&cli.disk, cli.sectors) {
            Ok((d, created)) => {
                let disk: Box<dyn SectorDevice> = Box::new(d);
                (disk, created)
            }
            Err(e) => {
                error!("[boot] cannot open {}: {}", cli.disk.display(), e);
                send(BootProgress::Finished(Err(Box::new(e))));
                return;
            }
        }
    };
    send(BootProgress::Progress(10));

    if created {
        // 只有“明确是新磁盘”才格式化
        send(BootProgress::Step("🔧 New disk, formatting..."));
        let formatted = FileSystem::format(&disk, cli.format_params(), |done, total| {
            send(BootProgress::Progress(10 + (80 * done / total.max(1)) as u64));
        });
        if let Err(e) = formatted {
            error!("[boot] format failed: {}", e);
            send(BootProgress::Finished(Err(Box::new(e))));
            return;
        }
    }
    send(BootProgress::Progress(90));

    send(BootProgress::Step("⚙️  Mounting file system..."));
    let mut fs = FileSystem::new(disk);
    // 不论是否新盘，最终都要挂载
    if let Err(e) = fs.ensure_geometry_loaded() {
        error!("[boot] mount failed: {}", e);
        send(BootProgress::Finished(Err(Box::new(e))));
        return;
    }

    if cli.memory {
        info!("[boot] memory disk mounted");
    } else {
        info!("[boot] {} mounted", cli.disk.display());
    }
    send(BootProgress::Progress(100));
    send(BootProgress::Finished(Ok(fs)));
}
