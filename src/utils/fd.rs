/// Inherited file descriptor handling
///
/// The executor hands every stream down as a raw descriptor number. Before
/// wrapping one in a `File` we ask the kernel whether it is open and whether
/// its access mode allows the requested direction.
use crate::config::types::{JtlError, Result};
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use std::fs::File;
use std::os::fd::FromRawFd;
use std::os::unix::io::RawFd;

/// Direction a descriptor will be used in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FdMode {
    Read,
    Write,
}

impl FdMode {
    fn name(self) -> &'static str {
        match self {
            FdMode::Read => "read",
            FdMode::Write => "write",
        }
    }
}

/// Verify that `fd` is open and usable in `mode`
pub fn check_fd_mode(fd: RawFd, mode: FdMode) -> Result<()> {
    if fd < 0 {
        return Err(JtlError::Descriptor(format!("fd {} is negative", fd)));
    }

    let flags = fcntl(fd, FcntlArg::F_GETFL)
        .map_err(|e| JtlError::Descriptor(format!("fd {} is not open: {}", fd, e)))?;
    let access = OFlag::from_bits_truncate(flags) & OFlag::O_ACCMODE;

    let allowed = match mode {
        FdMode::Read => access == OFlag::O_RDONLY || access == OFlag::O_RDWR,
        FdMode::Write => access == OFlag::O_WRONLY || access == OFlag::O_RDWR,
    };
    if !allowed {
        return Err(JtlError::Descriptor(format!(
            "fd {} is not open for {}",
            fd,
            mode.name()
        )));
    }
    Ok(())
}

/// Take ownership of an inherited descriptor as a `File`
///
/// The caller must not use `fd` afterwards; the returned file closes it.
pub fn open_fd(fd: RawFd, mode: FdMode) -> Result<File> {
    check_fd_mode(fd, mode)?;
    // SAFETY: fd was validated as open above and ownership moves to the File.
    Ok(unsafe { File::from_raw_fd(fd) })
}
