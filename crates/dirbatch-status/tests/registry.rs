use dirbatch_status::{StatusChain, StatusKind, StatusValue, TreeStatus};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Match {
    Matched,
    DirectoryOnly,
    TableOnly,
}

impl StatusKind for Match {
    const KIND: &'static str = "match";

    fn values() -> &'static [Self] {
        &[Self::Matched, Self::DirectoryOnly, Self::TableOnly]
    }

    fn rank(self) -> u32 {
        self as u32
    }

    fn display(self) -> &'static str {
        match self {
            Self::Matched => "Matched",
            Self::DirectoryOnly => "Directory only",
            Self::TableOnly => "Table only",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Job {
    Finished,
    Diverged,
    Timeout,
    Missing,
}

impl StatusKind for Job {
    const KIND: &'static str = "job";

    fn values() -> &'static [Self] {
        &[Self::Finished, Self::Diverged, Self::Timeout, Self::Missing]
    }

    fn rank(self) -> u32 {
        self as u32
    }

    fn display(self) -> &'static str {
        match self {
            Self::Finished => "Finished",
            Self::Diverged => "Diverged",
            Self::Timeout => "Timed out",
            Self::Missing => "Output missing",
        }
    }
}

fn sample(pick: u8) -> StatusValue {
    match pick % 3 {
        0 => TreeStatus::values()[usize::from(pick / 3) % 3].into(),
        1 => Match::values()[usize::from(pick / 3) % 3].into(),
        _ => Job::values()[usize::from(pick / 3) % 4].into(),
    }
}

fn build(observed: &[u8]) -> StatusChain {
    let mut chain = StatusChain::new();
    for pick in observed {
        chain.observe(sample(*pick)).unwrap();
    }
    chain
}

#[test]
fn three_kinds_share_one_space() {
    let mut chain = StatusChain::new();
    chain.ensure::<TreeStatus>().unwrap();
    chain.ensure::<Match>().unwrap();
    chain.observe(Job::Timeout.into()).unwrap();

    assert_eq!(chain.end(), 10);
    assert_eq!(chain.range_of("job"), Some(6..10));
    assert_eq!(chain.label(Job::Timeout.into()).unwrap(), "[8] Timed out");
    assert_eq!(
        chain.worst([Match::Matched.into(), TreeStatus::Invalid.into()]).unwrap(),
        Some(StatusValue::of(Match::Matched))
    );
}

proptest! {
    #[test]
    fn prop_registration_is_deterministic(observed in prop::collection::vec(any::<u8>(), 1..20)) {
        let a = build(&observed);
        let b = build(&observed);
        prop_assert_eq!(a.kinds(), b.kinds());
        prop_assert_eq!(a.end(), b.end());
        for id in 0..a.end() {
            prop_assert_eq!(a.status(id).unwrap(), b.status(id).unwrap());
        }
    }

    #[test]
    fn prop_ids_are_a_bijection(observed in prop::collection::vec(any::<u8>(), 1..20)) {
        let chain = build(&observed);
        for id in 0..chain.end() {
            let value = chain.status(id).unwrap();
            prop_assert_eq!(chain.global_id(value).unwrap(), id);
        }
        prop_assert!(chain.status(chain.end()).is_err());
    }
}
