use once_cell::sync::OnceCell;
use std::sync::Mutex;

use crate::constants::PRN_CODE_LEN;

/// G2 shift-register delay taps, indexed by `prn - 1`, for PRNs 1..=32.
const G2_DELAY: [usize; 32] = [
    5, 6, 7, 8, 17, 18, 139, 140, 141, 251, 252, 254, 255, 256, 257, 258, 469, 470, 471, 472, 473,
    474, 509, 512, 513, 514, 515, 516, 859, 860, 861, 862,
];

fn gen_l1ca_code(prn: u8) -> Vec<f64> {
    let mut g1 = [0i8; PRN_CODE_LEN];
    let mut g2 = [0i8; PRN_CODE_LEN];
    let mut r1 = [-1i8; 10];
    let mut r2 = [-1i8; 10];

    for i in 0..PRN_CODE_LEN {
        g1[i] = r1[9];
        g2[i] = r2[9];
        let c1 = r1[2] * r1[9];
        let c2 = r2[1] * r2[2] * r2[5] * r2[7] * r2[8] * r2[9];
        r1.rotate_right(1);
        r2.rotate_right(1);
        r1[0] = c1;
        r2[0] = c2;
    }

    let mut j = PRN_CODE_LEN - G2_DELAY[(prn - 1) as usize];
    let mut g = Vec::with_capacity(PRN_CODE_LEN);
    for i in 0..PRN_CODE_LEN {
        let v = -g1[i] * g2[j % PRN_CODE_LEN];
        g.push(v as f64);
        j += 1;
    }
    g
}

/// Builds the `±1` C/A code for `prn` (1..=32), padded one chip on either
/// side (`ca[-1]` at index 0, `ca[1023]` at index 1024) so the correlator
/// can index early/late samples without wrapping logic.
fn gen_padded(prn: u8) -> Vec<f64> {
    let core = gen_l1ca_code(prn);
    let mut padded = Vec::with_capacity(PRN_CODE_LEN + 2);
    padded.push(core[PRN_CODE_LEN - 1]);
    padded.extend_from_slice(&core);
    padded.push(core[0]);
    padded
}

/// Cache of padded C/A codes, one per PRN, built lazily and shared
/// read-only across channels.
pub struct CaCodeTable {
    codes: Mutex<Vec<Option<Vec<f64>>>>,
}

impl CaCodeTable {
    fn new() -> Self {
        Self {
            codes: Mutex::new(vec![None; 32]),
        }
    }

    /// Returns the padded `±1` code for `prn` (1..=32), generating and
    /// caching it on first use.
    pub fn get(&self, prn: u8) -> Vec<f64> {
        assert!((1..=32).contains(&prn), "prn out of range: {prn}");
        let mut codes = self.codes.lock().unwrap();
        let idx = (prn - 1) as usize;
        if codes[idx].is_none() {
            codes[idx] = Some(gen_padded(prn));
        }
        codes[idx].clone().unwrap()
    }
}

static TABLE: OnceCell<CaCodeTable> = OnceCell::new();

/// Global, process-wide C/A code cache. Safe to share read-only across
/// channel driver threads.
pub fn ca_code_table() -> &'static CaCodeTable {
    TABLE.get_or_init(CaCodeTable::new)
}
