//! API tests

use ntio_api::*;
use proptest::prelude::*;

#[test]
fn test_status_display() {
    assert_eq!(format!("{:?}", Status::PENDING), "STATUS_PENDING");
    assert_eq!(format!("{:?}", Status::from_raw(0xC000_1234)), "Status(0xc0001234)");
    assert!(format!("{}", Status::CANCELLED).contains("0xc0000120"));
}

#[test]
fn test_error_display() {
    let err = error::not_found("no async for iosb");
    assert_eq!(err.to_string(), "Not found: no async for iosb");
    assert_eq!(err.status(), Status::NOT_FOUND);
}

#[test]
fn test_ids_format() {
    let mut arena = Arena::new();
    let index = arena.insert(());
    let id = AsyncId::from_index(index);
    assert_eq!(format!("{}", id), "async#0.0");
    assert_eq!(id.index(), index);
}

#[test]
fn test_apc_status() {
    let call = ApcCall::AsyncIo { user: 1, sb: 2, status: Status::ALERTED };
    assert_eq!(call.async_status(), Some(Status::ALERTED));
    let user = ApcCall::User { func: 3, args: [0; 3] };
    assert_eq!(user.async_status(), None);
}

proptest! {
    // Removed indices never resolve again, whatever the interleaving.
    #[test]
    fn prop_removed_indices_stay_dead(ops in proptest::collection::vec(any::<bool>(), 1..64)) {
        let mut arena = Arena::new();
        let mut live = Vec::new();
        let mut dead = Vec::new();
        for (n, insert) in ops.into_iter().enumerate() {
            if insert || live.is_empty() {
                live.push((arena.insert(n), n));
            } else {
                let (index, value) = live.remove(0);
                prop_assert_eq!(arena.remove(index), Some(value));
                dead.push(index);
            }
        }
        for index in &dead {
            prop_assert!(arena.get(*index).is_none());
        }
        for (index, value) in &live {
            prop_assert_eq!(arena.get(*index), Some(value));
        }
        prop_assert_eq!(arena.len(), live.len());
    }
}
