//! Best-effort probe for the size of the CPU's level 1 data cache.
//!
//! The result only feeds the default [`Order`](crate::Order) of a tree, so
//! any failure degrades to `None` and the caller's fallback.

/// Returns the L1 data cache size in bytes, if the platform reports one.
///
/// The probe runs once per process when the `std` feature is enabled.
pub fn l1_data_cache_size() -> Option<usize> {
    #[cfg(feature = "std")]
    {
        static CACHE_SIZE: std::sync::OnceLock<Option<usize>> = std::sync::OnceLock::new();
        *CACHE_SIZE.get_or_init(probe)
    }

    #[cfg(not(feature = "std"))]
    {
        None
    }
}

#[cfg(all(feature = "std", target_os = "linux"))]
fn probe() -> Option<usize> {
    use std::fs;
    use std::path::Path;

    let base = Path::new("/sys/devices/system/cpu/cpu0/cache");
    let entries = fs::read_dir(base).ok()?;

    for entry in entries.flatten() {
        let dir = entry.path();
        let is_index = dir
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("index"));
        if !is_index {
            continue;
        }

        let read = |file: &str| fs::read_to_string(dir.join(file)).ok();
        let level = read("level");
        let kind = read("type");
        if level.as_deref().map(str::trim) != Some("1") {
            continue;
        }
        if !matches!(kind.as_deref().map(str::trim), Some("Data" | "Unified")) {
            continue;
        }
        if let Some(size) = read("size").as_deref().and_then(parse_size) {
            return Some(size);
        }
    }

    None
}

#[cfg(all(feature = "std", target_vendor = "apple"))]
fn probe() -> Option<usize> {
    let mut size: i64 = 0;
    let mut len = core::mem::size_of::<i64>();
    // SAFETY: the name is NUL-terminated, `size` and `len` outlive the call and
    // `len` holds the byte size of the buffer behind `size`. No new value is set.
    let status = unsafe {
        libc::sysctlbyname(
            c"hw.l1dcachesize".as_ptr(),
            core::ptr::from_mut(&mut size).cast(),
            &mut len,
            core::ptr::null_mut(),
            0,
        )
    };
    if status == -1 || size <= 0 {
        return None;
    }
    usize::try_from(size).ok()
}

#[cfg(all(
    feature = "std",
    not(any(target_os = "linux", target_vendor = "apple"))
))]
fn probe() -> Option<usize> {
    None
}

/// Parses sysfs cache sizes such as `32K`, `1M` or a plain byte count.
#[cfg_attr(not(all(feature = "std", target_os = "linux")), allow(dead_code))]
fn parse_size(text: &str) -> Option<usize> {
    let text = text.trim();
    let (digits, scale) = match text.as_bytes().last()? {
        b'K' | b'k' => (&text[..text.len() - 1], 1024),
        b'M' | b'm' => (&text[..text.len() - 1], 1024 * 1024),
        _ => (text, 1),
    };
    let size = digits.parse::<usize>().ok()?.checked_mul(scale)?;
    (size > 0).then_some(size)
}
