//! A fake native engine implementing the catalogues in-process.
//!
//! Lifecycle instrumentation: every destructor bumps a per-kind counter,
//! and buffers handed across the boundary (adb `get` / `iter_next`) are
//! tracked so tests can assert the wrapper freed them. Databases opened
//! with certain names change behavior: `fail-open` refuses to open,
//! `fail-close` makes the destructor report failure, `slow` sleeps inside
//! record operations to widen the native-call window for the concurrency
//! tests.

#![allow(dead_code)]

use std::alloc::{alloc, dealloc, Layout};
use std::ffi::{c_char, c_double, c_int, c_void, CStr, CString};
use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tcab::catalog::{AdbCatalog, ListCatalog, MapCatalog};

pub static LIST_DESTROYED: AtomicUsize = AtomicUsize::new(0);
pub static MAP_DESTROYED: AtomicUsize = AtomicUsize::new(0);
pub static ADB_DESTROYED: AtomicUsize = AtomicUsize::new(0);

/// Buffers currently owned by the host side; the copy-out discipline must
/// drive this back to its starting value.
pub static OUTSTANDING_NATIVE_BUFS: AtomicIsize = AtomicIsize::new(0);

/// Serializes tests that assert exact destructor counts.
pub static LIFECYCLE_LOCK: Mutex<()> = Mutex::new(());

const SLOW_CALL: Duration = Duration::from_millis(200);

unsafe fn grab(ptr: *const c_void, len: c_int) -> Vec<u8> {
    if len <= 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(ptr as *const u8, len as usize).to_vec()
    }
}

fn put_len(sp: *mut c_int, len: usize) {
    unsafe { *sp = len as c_int }
}

// Length-prefixed allocations stand in for the library's own allocator so
// the free side can recover the layout.
unsafe fn native_alloc(data: &[u8]) -> *mut c_void {
    let layout = Layout::from_size_align(data.len() + 8, 8).unwrap();
    let base = alloc(layout);
    (base as *mut u64).write(data.len() as u64);
    std::ptr::copy_nonoverlapping(data.as_ptr(), base.add(8), data.len());
    OUTSTANDING_NATIVE_BUFS.fetch_add(1, Ordering::SeqCst);
    base.add(8) as *mut c_void
}

unsafe extern "C" fn native_free(p: *mut c_void) {
    let base = (p as *mut u8).sub(8);
    let len = (base as *mut u64).read() as usize;
    dealloc(base, Layout::from_size_align(len + 8, 8).unwrap());
    OUTSTANDING_NATIVE_BUFS.fetch_sub(1, Ordering::SeqCst);
}

// ===== list =====

struct FakeList {
    items: Vec<Vec<u8>>,
}

unsafe fn list<'a>(p: *mut c_void) -> &'a mut FakeList {
    &mut *(p as *mut FakeList)
}

fn boxed_list(items: Vec<Vec<u8>>) -> *mut c_void {
    Box::into_raw(Box::new(FakeList { items })) as *mut c_void
}

unsafe extern "C" fn fl_new(anum: c_int) -> *mut c_void {
    let cap = if anum < 0 { 0 } else { anum as usize };
    Box::into_raw(Box::new(FakeList {
        items: Vec::with_capacity(cap),
    })) as *mut c_void
}

unsafe extern "C" fn fl_destroy(p: *mut c_void) -> bool {
    drop(Box::from_raw(p as *mut FakeList));
    LIST_DESTROYED.fetch_add(1, Ordering::SeqCst);
    true
}

unsafe extern "C" fn fl_len(p: *mut c_void) -> c_int {
    list(p).items.len() as c_int
}

unsafe extern "C" fn fl_value_at(p: *mut c_void, index: c_int, sp: *mut c_int) -> *const c_void {
    let l = list(p);
    if index < 0 || index as usize >= l.items.len() {
        return std::ptr::null();
    }
    let item = &l.items[index as usize];
    put_len(sp, item.len());
    item.as_ptr() as *const c_void
}

unsafe extern "C" fn fl_push(p: *mut c_void, ptr: *const c_void, size: c_int) {
    let item = grab(ptr, size);
    list(p).items.push(item);
}

unsafe extern "C" fn fl_lsearch(p: *mut c_void, ptr: *const c_void, size: c_int) -> c_int {
    let needle = grab(ptr, size);
    list(p)
        .items
        .iter()
        .position(|it| *it == needle)
        .map(|i| i as c_int)
        .unwrap_or(-1)
}

unsafe extern "C" fn fl_bsearch(p: *mut c_void, ptr: *const c_void, size: c_int) -> c_int {
    let needle = grab(ptr, size);
    list(p)
        .items
        .binary_search_by(|it| it.as_slice().cmp(needle.as_slice()))
        .map(|i| i as c_int)
        .unwrap_or(-1)
}

pub static FAKE_LIST: ListCatalog = ListCatalog {
    new: fl_new,
    destroy: fl_destroy,
    len: fl_len,
    value_at: fl_value_at,
    push: fl_push,
    linear_search: fl_lsearch,
    binary_search: fl_bsearch,
};

// ===== map =====

struct FakeMap {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    cursor: usize,
}

unsafe fn map<'a>(p: *mut c_void) -> &'a mut FakeMap {
    &mut *(p as *mut FakeMap)
}

unsafe extern "C" fn fm_new(_bnum: i64) -> *mut c_void {
    Box::into_raw(Box::new(FakeMap {
        entries: Vec::new(),
        cursor: 0,
    })) as *mut c_void
}

unsafe extern "C" fn fm_destroy(p: *mut c_void) -> bool {
    drop(Box::from_raw(p as *mut FakeMap));
    MAP_DESTROYED.fetch_add(1, Ordering::SeqCst);
    true
}

unsafe extern "C" fn fm_put(
    p: *mut c_void,
    kbuf: *const c_void,
    ksiz: c_int,
    vbuf: *const c_void,
    vsiz: c_int,
) {
    let (key, value) = (grab(kbuf, ksiz), grab(vbuf, vsiz));
    let m = map(p);
    match m.entries.iter_mut().find(|(k, _)| *k == key) {
        Some((_, v)) => *v = value,
        None => m.entries.push((key, value)),
    }
}

unsafe extern "C" fn fm_put_keep(
    p: *mut c_void,
    kbuf: *const c_void,
    ksiz: c_int,
    vbuf: *const c_void,
    vsiz: c_int,
) -> bool {
    let (key, value) = (grab(kbuf, ksiz), grab(vbuf, vsiz));
    let m = map(p);
    if m.entries.iter().any(|(k, _)| *k == key) {
        return false;
    }
    m.entries.push((key, value));
    true
}

unsafe extern "C" fn fm_put_cat(
    p: *mut c_void,
    kbuf: *const c_void,
    ksiz: c_int,
    vbuf: *const c_void,
    vsiz: c_int,
) {
    let (key, mut value) = (grab(kbuf, ksiz), grab(vbuf, vsiz));
    let m = map(p);
    match m.entries.iter_mut().find(|(k, _)| *k == key) {
        Some((_, v)) => v.append(&mut value),
        None => m.entries.push((key, value)),
    }
}

unsafe extern "C" fn fm_remove(p: *mut c_void, kbuf: *const c_void, ksiz: c_int) -> bool {
    let key = grab(kbuf, ksiz);
    let m = map(p);
    match m.entries.iter().position(|(k, _)| *k == key) {
        Some(i) => {
            m.entries.remove(i);
            true
        }
        None => false,
    }
}

unsafe extern "C" fn fm_get(
    p: *mut c_void,
    kbuf: *const c_void,
    ksiz: c_int,
    sp: *mut c_int,
) -> *const c_void {
    let key = grab(kbuf, ksiz);
    match map(p).entries.iter().find(|(k, _)| *k == key) {
        Some((_, v)) => {
            put_len(sp, v.len());
            v.as_ptr() as *const c_void
        }
        None => std::ptr::null(),
    }
}

unsafe extern "C" fn fm_iter_init(p: *mut c_void) {
    map(p).cursor = 0;
}

unsafe extern "C" fn fm_iter_next(p: *mut c_void, sp: *mut c_int) -> *const c_void {
    let m = map(p);
    if m.cursor >= m.entries.len() {
        return std::ptr::null();
    }
    let key = &m.entries[m.cursor].0;
    m.cursor += 1;
    put_len(sp, key.len());
    key.as_ptr() as *const c_void
}

unsafe extern "C" fn fm_iter_value(
    p: *mut c_void,
    _kbuf: *const c_void,
    sp: *mut c_int,
) -> *const c_void {
    let m = map(p);
    if m.cursor == 0 || m.cursor > m.entries.len() {
        return std::ptr::null();
    }
    let value = &m.entries[m.cursor - 1].1;
    put_len(sp, value.len());
    value.as_ptr() as *const c_void
}

unsafe extern "C" fn fm_len(p: *mut c_void) -> u64 {
    map(p).entries.len() as u64
}

unsafe extern "C" fn fm_byte_size(p: *mut c_void) -> u64 {
    map(p)
        .entries
        .iter()
        .map(|(k, v)| (k.len() + v.len()) as u64)
        .sum()
}

unsafe extern "C" fn fm_keys(p: *mut c_void) -> *mut c_void {
    boxed_list(map(p).entries.iter().map(|(k, _)| k.clone()).collect())
}

unsafe extern "C" fn fm_values(p: *mut c_void) -> *mut c_void {
    boxed_list(map(p).entries.iter().map(|(_, v)| v.clone()).collect())
}

unsafe extern "C" fn fm_clear(p: *mut c_void) {
    let m = map(p);
    m.entries.clear();
    m.cursor = 0;
}

pub static FAKE_MAP: MapCatalog = MapCatalog {
    new: fm_new,
    destroy: fm_destroy,
    put: fm_put,
    put_keep: fm_put_keep,
    put_cat: fm_put_cat,
    remove: fm_remove,
    get: fm_get,
    iter_init: fm_iter_init,
    iter_next: fm_iter_next,
    iter_value: fm_iter_value,
    len: fm_len,
    byte_size: fm_byte_size,
    keys: fm_keys,
    values: fm_values,
    clear: fm_clear,
};

// ===== abstract database =====

struct FakeAdb {
    name: CString,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    cursor: usize,
    tran_backup: Option<Vec<(Vec<u8>, Vec<u8>)>>,
    slow: bool,
    fail_close: bool,
}

unsafe fn adb<'a>(p: *mut c_void) -> &'a mut FakeAdb {
    &mut *(p as *mut FakeAdb)
}

fn nap_if_slow(a: &FakeAdb) {
    if a.slow {
        std::thread::sleep(SLOW_CALL);
    }
}

unsafe extern "C" fn fa_new() -> *mut c_void {
    Box::into_raw(Box::new(FakeAdb {
        name: CString::default(),
        entries: Vec::new(),
        cursor: 0,
        tran_backup: None,
        slow: false,
        fail_close: false,
    })) as *mut c_void
}

unsafe extern "C" fn fa_destroy(p: *mut c_void) -> bool {
    let boxed = Box::from_raw(p as *mut FakeAdb);
    let ok = !boxed.fail_close;
    drop(boxed);
    ADB_DESTROYED.fetch_add(1, Ordering::SeqCst);
    ok
}

unsafe extern "C" fn fa_open(p: *mut c_void, name: *const c_char) -> bool {
    let a = adb(p);
    let cname = CStr::from_ptr(name);
    let text = cname.to_string_lossy();
    if text.contains("fail-open") {
        return false;
    }
    a.slow = text.contains("slow");
    a.fail_close = text.contains("fail-close");
    a.name = cname.to_owned();
    true
}

unsafe extern "C" fn fa_put(
    p: *mut c_void,
    kbuf: *const c_void,
    ksiz: c_int,
    vbuf: *const c_void,
    vsiz: c_int,
) -> bool {
    let (key, value) = (grab(kbuf, ksiz), grab(vbuf, vsiz));
    let a = adb(p);
    nap_if_slow(a);
    match a.entries.iter_mut().find(|(k, _)| *k == key) {
        Some((_, v)) => *v = value,
        None => a.entries.push((key, value)),
    }
    true
}

unsafe extern "C" fn fa_put_keep(
    p: *mut c_void,
    kbuf: *const c_void,
    ksiz: c_int,
    vbuf: *const c_void,
    vsiz: c_int,
) -> bool {
    let (key, value) = (grab(kbuf, ksiz), grab(vbuf, vsiz));
    let a = adb(p);
    if a.entries.iter().any(|(k, _)| *k == key) {
        return false;
    }
    a.entries.push((key, value));
    true
}

unsafe extern "C" fn fa_put_cat(
    p: *mut c_void,
    kbuf: *const c_void,
    ksiz: c_int,
    vbuf: *const c_void,
    vsiz: c_int,
) -> bool {
    let (key, mut value) = (grab(kbuf, ksiz), grab(vbuf, vsiz));
    let a = adb(p);
    match a.entries.iter_mut().find(|(k, _)| *k == key) {
        Some((_, v)) => v.append(&mut value),
        None => a.entries.push((key, value)),
    }
    true
}

unsafe extern "C" fn fa_remove(p: *mut c_void, kbuf: *const c_void, ksiz: c_int) -> bool {
    let key = grab(kbuf, ksiz);
    let a = adb(p);
    match a.entries.iter().position(|(k, _)| *k == key) {
        Some(i) => {
            a.entries.remove(i);
            true
        }
        None => false,
    }
}

unsafe extern "C" fn fa_get(
    p: *mut c_void,
    kbuf: *const c_void,
    ksiz: c_int,
    sp: *mut c_int,
) -> *mut c_void {
    let key = grab(kbuf, ksiz);
    let a = adb(p);
    nap_if_slow(a);
    match a.entries.iter().find(|(k, _)| *k == key) {
        Some((_, v)) => {
            put_len(sp, v.len());
            native_alloc(v)
        }
        None => std::ptr::null_mut(),
    }
}

unsafe extern "C" fn fa_iter_init(p: *mut c_void) -> bool {
    adb(p).cursor = 0;
    true
}

unsafe extern "C" fn fa_iter_next(p: *mut c_void, sp: *mut c_int) -> *mut c_void {
    let a = adb(p);
    if a.cursor >= a.entries.len() {
        return std::ptr::null_mut();
    }
    let key = a.entries[a.cursor].0.clone();
    a.cursor += 1;
    put_len(sp, key.len());
    native_alloc(&key)
}

unsafe extern "C" fn fa_prefix_keys(
    p: *mut c_void,
    pbuf: *const c_void,
    psiz: c_int,
    max: c_int,
) -> *mut c_void {
    let prefix = grab(pbuf, psiz);
    let a = adb(p);
    let limit = if max < 0 { usize::MAX } else { max as usize };
    let keys = a
        .entries
        .iter()
        .filter(|(k, _)| k.starts_with(&prefix))
        .take(limit)
        .map(|(k, _)| k.clone())
        .collect();
    boxed_list(keys)
}

unsafe extern "C" fn fa_add_int(
    p: *mut c_void,
    kbuf: *const c_void,
    ksiz: c_int,
    num: c_int,
) -> c_int {
    let key = grab(kbuf, ksiz);
    let a = adb(p);
    match a.entries.iter_mut().find(|(k, _)| *k == key) {
        Some((_, v)) => {
            let Ok(bytes) = <[u8; 4]>::try_from(v.as_slice()) else {
                // Record exists but is not a number: the sentinel is all
                // the real library reports.
                return c_int::MIN;
            };
            let total = c_int::from_le_bytes(bytes).wrapping_add(num);
            *v = total.to_le_bytes().to_vec();
            total
        }
        None => {
            a.entries.push((key, num.to_le_bytes().to_vec()));
            num
        }
    }
}

unsafe extern "C" fn fa_add_double(
    p: *mut c_void,
    kbuf: *const c_void,
    ksiz: c_int,
    num: c_double,
) -> c_double {
    let key = grab(kbuf, ksiz);
    let a = adb(p);
    match a.entries.iter_mut().find(|(k, _)| *k == key) {
        Some((_, v)) => {
            let Ok(bytes) = <[u8; 8]>::try_from(v.as_slice()) else {
                return f64::NAN;
            };
            let total = f64::from_le_bytes(bytes) + num;
            *v = total.to_le_bytes().to_vec();
            total
        }
        None => {
            a.entries.push((key, num.to_le_bytes().to_vec()));
            num
        }
    }
}

unsafe extern "C" fn fa_sync(_p: *mut c_void) -> bool {
    true
}

unsafe extern "C" fn fa_optimize(_p: *mut c_void, _params: *const c_char) -> bool {
    true
}

unsafe extern "C" fn fa_vanish(p: *mut c_void) -> bool {
    let a = adb(p);
    a.entries.clear();
    a.cursor = 0;
    true
}

unsafe extern "C" fn fa_copy(_p: *mut c_void, _path: *const c_char) -> bool {
    true
}

unsafe extern "C" fn fa_tran_begin(p: *mut c_void) -> bool {
    let a = adb(p);
    if a.tran_backup.is_some() {
        return false;
    }
    a.tran_backup = Some(a.entries.clone());
    true
}

unsafe extern "C" fn fa_tran_commit(p: *mut c_void) -> bool {
    adb(p).tran_backup.take().is_some()
}

unsafe extern "C" fn fa_tran_abort(p: *mut c_void) -> bool {
    let a = adb(p);
    match a.tran_backup.take() {
        Some(backup) => {
            a.entries = backup;
            true
        }
        None => false,
    }
}

unsafe extern "C" fn fa_path(p: *mut c_void) -> *const c_char {
    adb(p).name.as_ptr()
}

unsafe extern "C" fn fa_len(p: *mut c_void) -> u64 {
    adb(p).entries.len() as u64
}

unsafe extern "C" fn fa_size(p: *mut c_void) -> u64 {
    adb(p)
        .entries
        .iter()
        .map(|(k, v)| (k.len() + v.len()) as u64)
        .sum()
}

unsafe extern "C" fn fa_value_size(p: *mut c_void, kbuf: *const c_void, ksiz: c_int) -> c_int {
    let key = grab(kbuf, ksiz);
    adb(p)
        .entries
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.len() as c_int)
        .unwrap_or(-1)
}

unsafe extern "C" fn fa_misc(
    p: *mut c_void,
    name: *const c_char,
    args: *mut c_void,
) -> *mut c_void {
    let _ = adb(p);
    match CStr::from_ptr(name).to_string_lossy().as_ref() {
        "echo" => boxed_list(list(args).items.clone()),
        _ => std::ptr::null_mut(),
    }
}

pub static FAKE_ADB: AdbCatalog = AdbCatalog {
    new: fa_new,
    destroy: fa_destroy,
    open: fa_open,
    put: fa_put,
    put_keep: fa_put_keep,
    put_cat: fa_put_cat,
    remove: fa_remove,
    get: fa_get,
    iter_init: fa_iter_init,
    iter_next: fa_iter_next,
    prefix_keys: fa_prefix_keys,
    add_int: fa_add_int,
    add_double: fa_add_double,
    sync: fa_sync,
    optimize: fa_optimize,
    vanish: fa_vanish,
    copy: fa_copy,
    tran_begin: fa_tran_begin,
    tran_commit: fa_tran_commit,
    tran_abort: fa_tran_abort,
    path: fa_path,
    len: fa_len,
    size: fa_size,
    value_size: fa_value_size,
    misc: fa_misc,
    free: native_free,
};
