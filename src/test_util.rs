pub(crate) fn bbox(x: u32, y: u32, w: u32, h: u32) -> crate::chat::BBoxPx {
    crate::chat::BBoxPx { x, y, w, h }
}

pub(crate) fn line(text: &str, x: u32, y: u32, w: u32, h: u32) -> crate::chat::OcrLine {
    crate::chat::OcrLine::new(text, bbox(x, y, w, h))
}

pub(crate) fn patterns_for(code: &str) -> crate::chat::Patterns {
    crate::locale::load_patterns(code, None).expect("embedded locale pack")
}

pub(crate) fn with_temp_home<F, R>(func: F) -> R
where
    F: FnOnce(&std::path::Path) -> R,
{
    static HOME_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
    let _guard = HOME_MUTEX
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let dir = tempfile::tempdir().expect("tempdir");
    let old_home = std::env::var("HOME").ok();
    // SAFETY: HOME_MUTEX serializes every test that touches the environment.
    unsafe { std::env::set_var("HOME", dir.path()) };
    let result = func(dir.path());
    if let Some(old) = old_home {
        unsafe { std::env::set_var("HOME", old) };
    } else {
        unsafe { std::env::remove_var("HOME") };
    }
    result
}
