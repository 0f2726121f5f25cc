use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Generates names for timer threads.
#[derive(Clone)]
pub(crate) struct ThreadNameFn(pub(crate) Arc<dyn Fn() -> String + Send + Sync + 'static>);

impl fmt::Debug for ThreadNameFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ThreadNameFn").field(&"<function>").finish()
    }
}

pub(crate) fn default_thread_name_fn() -> ThreadNameFn {
    static TIMER_COUNT: AtomicUsize = AtomicUsize::new(0);

    ThreadNameFn(Arc::new(|| {
        let id = TIMER_COUNT.fetch_add(1, Ordering::Relaxed);
        format!("hrtimer-{}", id)
    }))
}

/// Gets the OS-level name of the current thread.
///
/// Uses `pthread_getname_np`, the same name `std::thread::Builder::name`
/// sets on Linux (truncated to 15 bytes).
#[cfg(all(test, target_os = "linux"))]
pub(crate) fn get_current_thread_name() -> anyhow::Result<String> {
    use anyhow::anyhow;
    use std::ffi::CStr;

    const MAX_PTHREAD_NAME_LEN: usize = 16;

    let mut c_name_buf: [libc::c_char; MAX_PTHREAD_NAME_LEN] = [0; MAX_PTHREAD_NAME_LEN];

    // Safety: the buffer is valid for `MAX_PTHREAD_NAME_LEN` bytes and zeroed,
    // so the result is always NUL-terminated.
    let ret = unsafe {
        libc::pthread_getname_np(
            libc::pthread_self(),
            c_name_buf.as_mut_ptr(),
            MAX_PTHREAD_NAME_LEN,
        )
    };

    if ret != 0 {
        return Err(anyhow!("pthread_getname_np failed with error code: {}", ret));
    }

    // Safety: see above.
    let c_str = unsafe { CStr::from_ptr(c_name_buf.as_ptr()) };
    c_str
        .to_str()
        .map(str::to_string)
        .map_err(|e| anyhow!("Failed to convert thread name from CStr: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names_are_unique() {
        let name_fn = default_thread_name_fn();
        let a = name_fn.0();
        let b = name_fn.0();

        assert_ne!(a, b);
        for name in [a, b] {
            let parts = name.split('-').collect::<Vec<_>>();
            assert_eq!(parts[0], "hrtimer");
            assert!(parts[1].parse::<usize>().is_ok());
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_get_current_thread_name() -> anyhow::Result<()> {
        let handle = std::thread::Builder::new()
            .name("hrtimer-named".to_string())
            .spawn(get_current_thread_name)?;

        let name = handle.join().map_err(|_| anyhow::anyhow!("named thread panicked"))??;
        assert_eq!(name, "hrtimer-named");
        Ok(())
    }
}
