//! Module lookup through `/proc/<pid>/maps`

use std::fs;

use crate::error::{Error, Result};

/// Finds where a shared library is loaded inside the target.
pub trait ModuleLocator {
    /// Lowest virtual address of the first mapping whose path contains `module_name`.
    fn module_base(&self, module_name: &str) -> Result<u64>;

    /// On-disk path of the first mapping whose path contains `module_name`.
    fn module_path(&self, module_name: &str) -> Result<String>;
}

fn read_maps(pid: u32) -> Result<String> {
    fs::read_to_string(format!("/proc/{}/maps", pid))
        .map_err(|e| Error::ProcessUnavailable(format!("pid {}: {}", pid, e)))
}

/// Base address of `module_name` in process `pid`.
pub fn module_base_address(pid: u32, module_name: &str) -> Result<u64> {
    let maps = read_maps(pid)?;
    find_module_base(&maps, module_name)
        .ok_or_else(|| Error::ModuleNotMapped(module_name.to_string()))
}

/// On-disk path of `module_name` in process `pid`.
pub fn module_path(pid: u32, module_name: &str) -> Result<String> {
    let maps = read_maps(pid)?;
    find_module_path(&maps, module_name)
        .ok_or_else(|| Error::ModuleNotMapped(module_name.to_string()))
}

/// Parse a maps listing and return the start of the first matching region.
///
/// Lines look like `7f12a000-7f12b000 r--p 00000000 08:01 1234  /usr/lib/libfoo.so`.
/// The kernel lists regions in ascending address order, so the first match
/// is the load base.
pub fn find_module_base(maps: &str, module_name: &str) -> Option<u64> {
    maps.lines()
        .filter(|line| line_path(line).is_some_and(|path| path.contains(module_name)))
        .find_map(|line| {
            let (start, _) = line.split_once('-')?;
            u64::from_str_radix(start.trim(), 16).ok()
        })
}

pub fn find_module_path(maps: &str, module_name: &str) -> Option<String> {
    maps.lines()
        .filter_map(line_path)
        .find(|path| path.contains(module_name))
        .map(str::to_string)
}

/// Path column of a maps line (sixth field, may contain spaces).
fn line_path(line: &str) -> Option<&str> {
    let mut rest = line;
    for _ in 0..5 {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace)?;
        rest = &rest[end..];
    }
    let path = rest.trim();
    (!path.is_empty()).then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPS: &str = "\
55d0c0a00000-55d0c0a01000 r--p 00000000 08:01 131 /home/user/cs2/bin/linuxsteamrt64/cs2
7f3a10000000-7f3a10400000 r--p 00000000 08:01 200 /home/user/cs2/game/bin/linuxsteamrt64/libengine2.so
7f3a10400000-7f3a10900000 r-xp 00400000 08:01 200 /home/user/cs2/game/bin/linuxsteamrt64/libengine2.so
7f3a20000000-7f3a20100000 rw-p 00000000 00:00 0
7f3a30000000-7f3a31000000 r--p 00000000 08:01 300 /home/user/cs2/game/csgo/bin/linuxsteamrt64/libclient.so
7ffd5a000000-7ffd5a021000 rw-p 00000000 00:00 0                          [stack]
";

    #[test]
    fn test_find_module_base_first_region() {
        assert_eq!(
            find_module_base(MAPS, "libengine2.so"),
            Some(0x7f3a_1000_0000)
        );
        assert_eq!(
            find_module_base(MAPS, "libclient.so"),
            Some(0x7f3a_3000_0000)
        );
    }

    #[test]
    fn test_find_module_base_missing() {
        assert_eq!(find_module_base(MAPS, "libtier0.so"), None);
        assert_eq!(find_module_base("", "libclient.so"), None);
    }

    #[test]
    fn test_only_path_column_matches() {
        // Only the path column is matched, never perms or device fields
        assert_eq!(find_module_base(MAPS, "rw-p"), None);
        assert_eq!(find_module_base(MAPS, "08:01"), None);
        assert_eq!(find_module_base(MAPS, "[stack]"), Some(0x7ffd_5a00_0000));
    }

    #[test]
    fn test_find_module_path() {
        assert_eq!(
            find_module_path(MAPS, "libclient.so").as_deref(),
            Some("/home/user/cs2/game/csgo/bin/linuxsteamrt64/libclient.so")
        );
    }
}
