//! Catalogues bound to the system `tokyocabinet` library.
//!
//! Raw declarations plus the thin adapters that normalize the library's
//! split constructors and void destructors to the catalogue signatures.
//! Everything here is reachable only through the catalogues; the safe
//! adapters never name these symbols directly.

use std::ffi::{c_char, c_double, c_int, c_void};

use crate::catalog::{AdbCatalog, ListCatalog, MapCatalog};

#[link(name = "tokyocabinet")]
extern "C" {
    fn tcfree(ptr: *mut c_void);

    fn tclistnew() -> *mut c_void;
    fn tclistnew2(anum: c_int) -> *mut c_void;
    fn tclistdel(list: *mut c_void);
    fn tclistnum(list: *mut c_void) -> c_int;
    fn tclistval(list: *mut c_void, index: c_int, sp: *mut c_int) -> *const c_void;
    fn tclistpush(list: *mut c_void, ptr: *const c_void, size: c_int);
    fn tclistlsearch(list: *mut c_void, ptr: *const c_void, size: c_int) -> c_int;
    fn tclistbsearch(list: *mut c_void, ptr: *const c_void, size: c_int) -> c_int;

    fn tcmapnew() -> *mut c_void;
    fn tcmapnew2(bnum: u32) -> *mut c_void;
    fn tcmapdel(map: *mut c_void);
    fn tcmapput(map: *mut c_void, kbuf: *const c_void, ksiz: c_int, vbuf: *const c_void, vsiz: c_int);
    fn tcmapputkeep(
        map: *mut c_void,
        kbuf: *const c_void,
        ksiz: c_int,
        vbuf: *const c_void,
        vsiz: c_int,
    ) -> bool;
    fn tcmapputcat(
        map: *mut c_void,
        kbuf: *const c_void,
        ksiz: c_int,
        vbuf: *const c_void,
        vsiz: c_int,
    );
    fn tcmapout(map: *mut c_void, kbuf: *const c_void, ksiz: c_int) -> bool;
    fn tcmapget(map: *mut c_void, kbuf: *const c_void, ksiz: c_int, sp: *mut c_int)
        -> *const c_void;
    fn tcmapiterinit(map: *mut c_void);
    fn tcmapiternext(map: *mut c_void, sp: *mut c_int) -> *const c_void;
    fn tcmapiterval(kbuf: *const c_void, sp: *mut c_int) -> *const c_void;
    fn tcmaprnum(map: *mut c_void) -> u64;
    fn tcmapmsiz(map: *mut c_void) -> u64;
    fn tcmapkeys(map: *mut c_void) -> *mut c_void;
    fn tcmapvals(map: *mut c_void) -> *mut c_void;
    fn tcmapclear(map: *mut c_void);

    fn tcadbnew() -> *mut c_void;
    fn tcadbdel(adb: *mut c_void);
    fn tcadbopen(adb: *mut c_void, name: *const c_char) -> bool;
    fn tcadbclose(adb: *mut c_void) -> bool;
    fn tcadbput(
        adb: *mut c_void,
        kbuf: *const c_void,
        ksiz: c_int,
        vbuf: *const c_void,
        vsiz: c_int,
    ) -> bool;
    fn tcadbputkeep(
        adb: *mut c_void,
        kbuf: *const c_void,
        ksiz: c_int,
        vbuf: *const c_void,
        vsiz: c_int,
    ) -> bool;
    fn tcadbputcat(
        adb: *mut c_void,
        kbuf: *const c_void,
        ksiz: c_int,
        vbuf: *const c_void,
        vsiz: c_int,
    ) -> bool;
    fn tcadbout(adb: *mut c_void, kbuf: *const c_void, ksiz: c_int) -> bool;
    fn tcadbget(adb: *mut c_void, kbuf: *const c_void, ksiz: c_int, sp: *mut c_int) -> *mut c_void;
    fn tcadbiterinit(adb: *mut c_void) -> bool;
    fn tcadbiternext(adb: *mut c_void, sp: *mut c_int) -> *mut c_void;
    fn tcadbfwmkeys(adb: *mut c_void, pbuf: *const c_void, psiz: c_int, max: c_int) -> *mut c_void;
    fn tcadbaddint(adb: *mut c_void, kbuf: *const c_void, ksiz: c_int, num: c_int) -> c_int;
    fn tcadbadddouble(adb: *mut c_void, kbuf: *const c_void, ksiz: c_int, num: c_double)
        -> c_double;
    fn tcadbsync(adb: *mut c_void) -> bool;
    fn tcadboptimize(adb: *mut c_void, params: *const c_char) -> bool;
    fn tcadbvanish(adb: *mut c_void) -> bool;
    fn tcadbcopy(adb: *mut c_void, path: *const c_char) -> bool;
    fn tcadbtranbegin(adb: *mut c_void) -> bool;
    fn tcadbtrancommit(adb: *mut c_void) -> bool;
    fn tcadbtranabort(adb: *mut c_void) -> bool;
    fn tcadbpath(adb: *mut c_void) -> *const c_char;
    fn tcadbrnum(adb: *mut c_void) -> u64;
    fn tcadbsize(adb: *mut c_void) -> u64;
    fn tcadbvsiz(adb: *mut c_void, kbuf: *const c_void, ksiz: c_int) -> c_int;
    fn tcadbmisc(adb: *mut c_void, name: *const c_char, args: *mut c_void) -> *mut c_void;
}

unsafe extern "C" fn list_new(anum: c_int) -> *mut c_void {
    if anum < 0 {
        tclistnew()
    } else {
        tclistnew2(anum)
    }
}

unsafe extern "C" fn list_destroy(list: *mut c_void) -> bool {
    tclistdel(list);
    true
}

unsafe extern "C" fn map_new(bnum: i64) -> *mut c_void {
    if bnum < 0 {
        tcmapnew()
    } else {
        tcmapnew2(bnum as u32)
    }
}

unsafe extern "C" fn map_destroy(map: *mut c_void) -> bool {
    tcmapdel(map);
    true
}

// The real iterval keys off the record pointer alone.
unsafe extern "C" fn map_iter_value(
    _map: *mut c_void,
    kbuf: *const c_void,
    sp: *mut c_int,
) -> *const c_void {
    tcmapiterval(kbuf, sp)
}

unsafe extern "C" fn adb_destroy(adb: *mut c_void) -> bool {
    let ok = tcadbclose(adb);
    tcadbdel(adb);
    ok
}

pub static LIST_SYS: ListCatalog = ListCatalog {
    new: list_new,
    destroy: list_destroy,
    len: tclistnum,
    value_at: tclistval,
    push: tclistpush,
    linear_search: tclistlsearch,
    binary_search: tclistbsearch,
};

pub static MAP_SYS: MapCatalog = MapCatalog {
    new: map_new,
    destroy: map_destroy,
    put: tcmapput,
    put_keep: tcmapputkeep,
    put_cat: tcmapputcat,
    remove: tcmapout,
    get: tcmapget,
    iter_init: tcmapiterinit,
    iter_next: tcmapiternext,
    iter_value: map_iter_value,
    len: tcmaprnum,
    byte_size: tcmapmsiz,
    keys: tcmapkeys,
    values: tcmapvals,
    clear: tcmapclear,
};

pub static ADB_SYS: AdbCatalog = AdbCatalog {
    new: tcadbnew,
    destroy: adb_destroy,
    open: tcadbopen,
    put: tcadbput,
    put_keep: tcadbputkeep,
    put_cat: tcadbputcat,
    remove: tcadbout,
    get: tcadbget,
    iter_init: tcadbiterinit,
    iter_next: tcadbiternext,
    prefix_keys: tcadbfwmkeys,
    add_int: tcadbaddint,
    add_double: tcadbadddouble,
    sync: tcadbsync,
    optimize: tcadboptimize,
    vanish: tcadbvanish,
    copy: tcadbcopy,
    tran_begin: tcadbtranbegin,
    tran_commit: tcadbtrancommit,
    tran_abort: tcadbtranabort,
    path: tcadbpath,
    len: tcadbrnum,
    size: tcadbsize,
    value_size: tcadbvsiz,
    misc: tcadbmisc,
    free: tcfree,
};

impl crate::List {
    /// [`List::new`](crate::List::new) against the system library.
    pub fn new_system(capacity: Option<usize>) -> crate::Result<crate::List> {
        crate::List::new(&LIST_SYS, capacity)
    }
}

impl crate::Map {
    /// [`Map::new`](crate::Map::new) against the system library.
    pub fn new_system(buckets: Option<u32>) -> crate::Result<crate::Map> {
        crate::Map::new(&MAP_SYS, &LIST_SYS, buckets)
    }
}

impl crate::Adb {
    /// [`Adb::open`](crate::Adb::open) against the system library.
    pub fn open_system(name: &str) -> crate::Result<crate::Adb> {
        crate::Adb::open(&ADB_SYS, &LIST_SYS, name)
    }
}
