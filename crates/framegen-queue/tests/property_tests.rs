//! Property-based tests for the slot queue.

use framegen_queue::slot_queue;
use quickcheck_macros::quickcheck;

#[quickcheck]
fn full_queue_rejects_exactly_one_more(capacity: u8) -> bool {
    let capacity = usize::from(capacity).clamp(2, 200);
    let Ok((mut tx, _rx)) = slot_queue::<usize>(capacity) else {
        return false;
    };
    for i in 0..capacity - 1 {
        if tx.push(i).is_err() {
            return false;
        }
    }
    let before = tx.monitor().dropped();
    tx.push(usize::MAX).is_err() && tx.monitor().dropped() == before + 1
}

#[quickcheck]
fn interleaved_ops_match_model(capacity: u8, ops: Vec<bool>) -> bool {
    let capacity = usize::from(capacity).clamp(2, 32);
    let Ok((mut tx, mut rx)) = slot_queue::<usize>(capacity) else {
        return false;
    };
    let mut model = std::collections::VecDeque::new();
    let mut dropped = 0u64;
    for (i, push) in ops.into_iter().enumerate() {
        if push {
            if model.len() < capacity - 1 {
                model.push_back(i);
                if tx.push(i).is_err() {
                    return false;
                }
            } else {
                dropped += 1;
                if tx.push(i).is_ok() {
                    return false;
                }
            }
        } else if rx.pop() != model.pop_front() {
            return false;
        }
        if rx.len() != model.len() || rx.peek() != model.front() {
            return false;
        }
    }
    tx.monitor().dropped() == dropped
}
