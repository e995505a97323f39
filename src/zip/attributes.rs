//! Recorded attributes applied to a materialized entry.

use std::fs::{File, FileTimes};
use std::io;
use std::path::Path;
use std::time::SystemTime;

use super::structures::{Entry, EntryKind};

/// Apply the entry's permission bits and modification time to `path`.
///
/// Symbolic links are left alone: setting either on the link would follow
/// it to the target. Permission bits are only applied on unix.
pub fn apply(entry: &Entry, path: &Path) -> io::Result<()> {
    if entry.kind == EntryKind::Symlink {
        return Ok(());
    }

    // Times first: a read-only mode would stop us opening the file.
    if let Some(modified) = entry.modified() {
        let modified: SystemTime = modified.assume_utc().into();
        set_modified(path, entry.kind, modified)?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = entry.unix_mode() {
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
        }
    }
    Ok(())
}

fn set_modified(path: &Path, kind: EntryKind, modified: SystemTime) -> io::Result<()> {
    let file = match kind {
        EntryKind::Directory => open_directory(path)?,
        _ => File::options().write(true).open(path)?,
    };
    file.set_times(FileTimes::new().set_modified(modified))
}

#[cfg(windows)]
fn open_directory(path: &Path) -> io::Result<File> {
    use std::os::windows::fs::OpenOptionsExt;
    // FILE_FLAG_BACKUP_SEMANTICS is required to open a directory handle.
    File::options()
        .write(true)
        .custom_flags(0x0200_0000)
        .open(path)
}

#[cfg(not(windows))]
fn open_directory(path: &Path) -> io::Result<File> {
    File::open(path)
}
