use sha3::{Digest, Sha3_256};

/// States handed to clients carry a seal over their contents so that edited
/// states are rejected when they come back.
pub trait ProtectedState {
    fn compute_seal_info(&self) -> String;

    fn seal(&self) -> String {
        seal(&self.compute_seal_info())
    }

    fn verify_seal(&self, seal: &str) -> bool {
        verify(&self.compute_seal_info(), seal)
    }
}

pub fn seal(info: &str) -> String {
    let payload = format!(
        "i understand that modifying this object may lead to incorrect proofs|{}",
        info
    );
    let mut hasher = Sha3_256::new();
    hasher.update(payload);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect()
}

pub fn verify(info: &str, hash: &str) -> bool {
    seal(info) == hash
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy(&'static str);

    impl ProtectedState for Dummy {
        fn compute_seal_info(&self) -> String {
            format!("dummy|{}", self.0)
        }
    }

    #[test]
    fn seal_shape() {
        let s = seal("abc");
        assert_eq!(64, s.len());
        assert!(s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_eq!(s, seal("abc"));
        assert_ne!(s, seal("abd"));
    }

    #[test]
    fn verify_state() {
        let d = Dummy("(P->Q)");
        let s = d.seal();
        assert!(d.verify_seal(&s));
        assert!(!Dummy("(Q->P)").verify_seal(&s));
        assert!(!d.verify_seal(&s.to_lowercase()));
    }
}
