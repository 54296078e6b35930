//! Content fingerprints for checker output. Two runs over the same unit must
//! produce the same fingerprint for every class.

use sha2::{Digest, Sha256};

use crate::typeck::{ClassOutcome, ClassReport, UnitReport};

/// A SHA-256 digest.
pub type Fingerprint = [u8; 32];

/// Hash the observable result of checking one class: ancestors, the
/// inherited member set, verdicts and diagnostics, in their report order.
pub fn fingerprint_report(report: &ClassReport) -> Fingerprint {
    let mut hasher = Sha256::new();
    hash_report(&mut hasher, report);
    hasher.finalize().into()
}

pub fn fingerprint_outcome(outcome: &ClassOutcome) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(outcome.name.as_bytes());
    hasher.update(b"\0");
    match &outcome.result {
        Ok(report) => hash_report(&mut hasher, report),
        Err(e) => {
            hasher.update(b"err:");
            hasher.update(e.to_string().as_bytes());
            hasher.update(e.span().to_string().as_bytes());
        }
    }
    hasher.finalize().into()
}

/// One digest for a whole unit, folding the per-class fingerprints in order.
pub fn fingerprint_unit(report: &UnitReport) -> Fingerprint {
    let mut hasher = Sha256::new();
    for outcome in &report.outcomes {
        hasher.update(fingerprint_outcome(outcome));
    }
    hasher.finalize().into()
}

pub fn to_hex(fp: &Fingerprint) -> String {
    fp.iter().map(|b| format!("{b:02x}")).collect()
}

fn hash_report(hasher: &mut Sha256, report: &ClassReport) {
    let h = &report.hierarchy;
    hasher.update(h.class.name().as_bytes());
    hasher.update(b"\0");
    for ancestor in &h.ancestors {
        hasher.update(b"a:");
        hasher.update(ancestor.to_string().as_bytes());
        hasher.update(b"\0");
    }
    for (name, bucket) in &h.inherited {
        hasher.update(b"m:");
        hasher.update(name.as_bytes());
        for c in &bucket.candidates {
            hasher.update(b"|");
            hasher.update(c.origin.to_string().as_bytes());
            hasher.update(b"::");
            hasher.update(c.sig.to_string().as_bytes());
        }
        if let Some(conflict) = &bucket.conflict {
            hasher.update(b"!conflict");
            for o in &conflict.origins {
                hasher.update(o.to_string().as_bytes());
            }
        }
        hasher.update(b"\0");
    }
    for v in &report.verdicts {
        hasher.update(b"v:");
        hasher.update(format!("{}#{}={}:{}", v.member, v.member_index, v.outcome, v.detail).as_bytes());
        hasher.update(b"\0");
    }
    for d in &report.diagnostics {
        hasher.update(b"d:");
        hasher.update(d.to_string().as_bytes());
        hasher.update(d.span.to_string().as_bytes());
        hasher.update(b"\0");
    }
}
