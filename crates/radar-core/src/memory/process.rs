use std::fs::{self, File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::maps;
use crate::memory::{ModuleLocator, ReadMemory, WriteMemory};

/// Open handle to a running process's memory (`/proc/<pid>/mem`).
///
/// The handle is released when the value is dropped or [`ProcessHandle::close`]
/// is called; a closed handle cannot be used again.
#[derive(Debug)]
pub struct ProcessHandle {
    pub pid: u32,
    memory: File,
    writable: bool,
}

/// Basic information about a discovered process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub exe_name: String,
}

impl ProcessHandle {
    /// Open a process by PID, read/write if permitted, otherwise read-only.
    pub fn open(pid: u32) -> Result<Self> {
        if !Self::pid_exists(pid) {
            return Err(Error::ProcessUnavailable(format!("pid {} does not exist", pid)));
        }

        let path = format!("/proc/{}/mem", pid);
        match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(memory) => Ok(Self {
                pid,
                memory,
                writable: true,
            }),
            Err(e) => {
                debug!("Read/write open of {} failed ({}), trying read-only", path, e);
                let memory = File::open(&path)
                    .map_err(|e| Error::ProcessUnavailable(format!("{}: {}", path, e)))?;
                Ok(Self {
                    pid,
                    memory,
                    writable: false,
                })
            }
        }
    }

    /// Find a process by executable file name and open it.
    pub fn find_by_name(exe_name: &str) -> Result<Self> {
        let info = find_process(exe_name)?
            .ok_or_else(|| Error::ProcessUnavailable(format!("no process named {}", exe_name)))?;
        Self::open(info.pid)
    }

    fn pid_exists(pid: u32) -> bool {
        Path::new(&format!("/proc/{}", pid)).exists()
    }

    /// Whether the process still exists.
    pub fn is_alive(&self) -> bool {
        Self::pid_exists(self.pid)
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Release the OS handle.
    pub fn close(self) {
        debug!("Closing handle for pid {}", self.pid);
        drop(self);
    }
}

impl ReadMemory for ProcessHandle {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        self.memory
            .read_exact_at(&mut buffer, address)
            .map_err(|e| self.read_error(address, e))?;
        Ok(buffer)
    }
}

impl ProcessHandle {
    fn read_error(&self, address: u64, e: std::io::Error) -> Error {
        if self.is_alive() {
            Error::MemoryReadFailed {
                address,
                message: e.to_string(),
            }
        } else {
            Error::ProcessUnavailable(format!("pid {} exited", self.pid))
        }
    }
}

impl WriteMemory for ProcessHandle {
    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()> {
        if !self.writable {
            return Err(Error::ProcessUnavailable(format!(
                "pid {} was opened read-only",
                self.pid
            )));
        }
        self.memory
            .write_all_at(bytes, address)
            .map_err(|e| self.read_error(address, e))
    }
}

impl ModuleLocator for ProcessHandle {
    fn module_base(&self, module_name: &str) -> Result<u64> {
        maps::module_base_address(self.pid, module_name)
    }

    fn module_path(&self, module_name: &str) -> Result<String> {
        maps::module_path(self.pid, module_name)
    }
}

/// Scan `/proc` for a process whose executable file name equals `exe_name`.
pub fn find_process(exe_name: &str) -> Result<Option<ProcessInfo>> {
    for entry in fs::read_dir("/proc")? {
        let Ok(entry) = entry else { continue };

        let Some(pid) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<u32>().ok())
        else {
            continue;
        };

        // Permission errors and races with exiting processes are expected here
        let Ok(exe_path) = fs::read_link(entry.path().join("exe")) else {
            continue;
        };

        if exe_path
            .file_name()
            .is_some_and(|name| name.to_string_lossy() == exe_name)
        {
            return Ok(Some(ProcessInfo {
                pid,
                exe_name: exe_name.to_string(),
            }));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_self_and_read_back() {
        let marker: u64 = 0xDEAD_BEEF_CAFE_F00D;
        let handle = ProcessHandle::open(std::process::id()).unwrap();
        let address = &marker as *const u64 as u64;
        assert_eq!(handle.read_u64(address).unwrap(), marker);
        assert!(handle.is_alive());
    }

    #[test]
    fn test_read_unmapped_address_fails() {
        let handle = ProcessHandle::open(std::process::id()).unwrap();
        assert!(handle.read_u64(0).is_err());
    }

    #[test]
    fn test_locate_own_executable() {
        let exe = std::env::current_exe().unwrap();
        let name = exe.file_name().unwrap().to_str().unwrap().to_string();
        let handle = ProcessHandle::open(std::process::id()).unwrap();

        assert!(handle.module_base(&name).unwrap() > 0);
        assert!(handle.module_path(&name).unwrap().ends_with(&name));
        assert!(matches!(
            handle.module_path("libdoes-not-exist.so"),
            Err(Error::ModuleNotMapped(_))
        ));
    }

    #[test]
    fn test_open_missing_pid() {
        let err = ProcessHandle::open(u32::MAX).unwrap_err();
        assert!(err.is_process_gone());
    }
}
