/*!
 * Pid Lifecycle Tests
 * Allocation, detach, exit and reclamation without blocking
 */

use pid_kernel::{
    InvalidReason, JoinFlags, PidError, PidManager, BOOTUP_PID, INVALID_PID,
};
use pretty_assertions::assert_eq;

fn small_manager() -> PidManager {
    PidManager::builder()
        .with_capacity(4)
        .with_pid_range(2, 9)
        .build()
        .unwrap()
}

fn assert_consistent(pm: &PidManager) {
    let stats = pm.stats();
    assert_eq!(stats.allocated, stats.occupied_slots);
}

#[test]
fn test_bootstrap_state() {
    let pm = PidManager::bootstrap();
    let stats = pm.stats();
    assert_eq!(stats.allocated, 1);
    assert_eq!(stats.capacity, 128);
    assert_eq!(stats.next_candidate, 2);
    assert!(pm.contains(BOOTUP_PID));
    assert_eq!(pm.parent_of(BOOTUP_PID), Ok(INVALID_PID));
}

#[test]
fn test_alloc_sequential_pids() {
    let pm = PidManager::bootstrap();
    assert_eq!(pm.alloc(BOOTUP_PID), Ok(2));
    assert_eq!(pm.alloc(BOOTUP_PID), Ok(3));
    assert_eq!(pm.alloc(BOOTUP_PID), Ok(4));
    assert_eq!(pm.parent_of(3), Ok(BOOTUP_PID));
    assert!(pm.is_child(BOOTUP_PID, 3));
    assert_consistent(&pm);
}

#[test]
fn test_alloc_from_unknown_caller() {
    let pm = PidManager::bootstrap();
    assert_eq!(pm.alloc(77), Err(PidError::NoSuchProcess(77)));
    assert_eq!(pm.alloc(INVALID_PID), Err(PidError::NoSuchProcess(INVALID_PID)));
    assert_eq!(pm.stats().allocated, 1);
    assert!(pm.stats().is_consistent());
}

#[test]
fn test_table_full_then_reuse_after_wrap() {
    let pm = small_manager();
    assert_eq!(pm.alloc(BOOTUP_PID), Ok(2));
    assert_eq!(pm.alloc(BOOTUP_PID), Ok(3));
    assert_eq!(pm.alloc(BOOTUP_PID), Ok(4));
    assert_eq!(pm.alloc(BOOTUP_PID), Err(PidError::TableFull));
    assert_eq!(PidError::TableFull.errno().code(), 11);

    // Free pid 3; its slot comes back, but under the next identifier
    pm.exit(3, 0, false);
    assert_eq!(pm.wait(BOOTUP_PID, 3), Ok(0));
    assert_consistent(&pm);
    assert_eq!(pm.alloc(BOOTUP_PID), Ok(7));
    assert_eq!(pm.alloc(BOOTUP_PID), Err(PidError::TableFull));

    // Only once the cursor wraps does pid 3 come back
    pm.exit(7, 0, false);
    assert_eq!(pm.wait(BOOTUP_PID, 7), Ok(0));
    assert_eq!(pm.alloc(BOOTUP_PID), Ok(3));
    assert_consistent(&pm);
}

#[test]
fn test_join_already_exited() {
    let pm = PidManager::bootstrap();
    let pid = pm.alloc(BOOTUP_PID).unwrap();
    pm.exit(pid, 17, false);
    assert!(pm.contains(pid));

    let mut status = 0;
    assert_eq!(pm.join(BOOTUP_PID, pid, Some(&mut status), JoinFlags::NONE), Ok(pid));
    assert_eq!(status, 17);
    assert!(!pm.contains(pid));
    assert_eq!(
        pm.join(BOOTUP_PID, pid, None, JoinFlags::NONE),
        Err(PidError::NoSuchProcess(pid))
    );
    assert_consistent(&pm);
}

#[test]
fn test_join_without_status_slot() {
    let pm = PidManager::bootstrap();
    let pid = pm.alloc(BOOTUP_PID).unwrap();
    pm.exit(pid, 5, false);
    assert_eq!(pm.join(BOOTUP_PID, pid, None, JoinFlags::NONE), Ok(pid));
    assert!(!pm.contains(pid));
}

#[test]
fn test_join_errors() {
    let pm = PidManager::bootstrap();
    let pid = pm.alloc(BOOTUP_PID).unwrap();

    assert_eq!(
        pm.join(pid, INVALID_PID, None, JoinFlags::NONE),
        Err(PidError::InvalidArgument(InvalidReason::ReservedPid))
    );
    assert_eq!(
        pm.join(pid, BOOTUP_PID, None, JoinFlags::NONE),
        Err(PidError::InvalidArgument(InvalidReason::ReservedPid))
    );
    assert_eq!(
        pm.join(BOOTUP_PID, 999, None, JoinFlags::NONE),
        Err(PidError::NoSuchProcess(999))
    );
    assert_eq!(
        pm.join(pid, pid, None, JoinFlags::NONE),
        Err(PidError::Deadlock(pid))
    );
    assert_eq!(PidError::Deadlock(pid).errno().code(), 35);
}

#[test]
fn test_join_no_hang_on_running_target() {
    let pm = PidManager::bootstrap();
    let pid = pm.alloc(BOOTUP_PID).unwrap();

    let mut status = -1;
    assert_eq!(
        pm.join(BOOTUP_PID, pid, Some(&mut status), JoinFlags::NO_HANG),
        Ok(INVALID_PID)
    );
    assert_eq!(status, -1);
    assert_eq!(pm.joiners(pid), Ok(0));

    pm.exit(pid, 8, false);
    assert_eq!(
        pm.join(BOOTUP_PID, pid, Some(&mut status), JoinFlags::NO_HANG),
        Ok(pid)
    );
    assert_eq!(status, 8);
}

#[test]
fn test_detach_then_exit_reclaims() {
    let pm = PidManager::bootstrap();
    let pid = pm.alloc(BOOTUP_PID).unwrap();

    assert_eq!(pm.detach(BOOTUP_PID, pid), Ok(()));
    assert!(pm.contains(pid));
    assert_eq!(
        pm.join(BOOTUP_PID, pid, None, JoinFlags::NONE),
        Err(PidError::InvalidArgument(InvalidReason::Detached))
    );

    pm.exit(pid, 0, false);
    assert!(!pm.contains(pid));
    assert_eq!(
        pm.join(BOOTUP_PID, pid, None, JoinFlags::NONE),
        Err(PidError::NoSuchProcess(pid))
    );
    assert_consistent(&pm);
}

#[test]
fn test_detach_exited_reclaims_immediately() {
    let pm = PidManager::bootstrap();
    let pid = pm.alloc(BOOTUP_PID).unwrap();
    pm.exit(pid, 3, false);
    assert_eq!(pm.detach(BOOTUP_PID, pid), Ok(()));
    assert!(!pm.contains(pid));
    assert_eq!(pm.stats().allocated, 1);
}

#[test]
fn test_detach_errors() {
    let pm = PidManager::bootstrap();
    let parent = pm.alloc(BOOTUP_PID).unwrap();
    let child = pm.alloc(parent).unwrap();

    assert_eq!(
        pm.detach(BOOTUP_PID, INVALID_PID),
        Err(PidError::InvalidArgument(InvalidReason::ReservedPid))
    );
    assert_eq!(
        pm.detach(parent, BOOTUP_PID),
        Err(PidError::InvalidArgument(InvalidReason::ReservedPid))
    );
    assert_eq!(pm.detach(parent, 4000), Err(PidError::NoSuchProcess(4000)));
    assert_eq!(
        pm.detach(BOOTUP_PID, child),
        Err(PidError::InvalidArgument(InvalidReason::NotParent))
    );

    assert_eq!(pm.detach(parent, child), Ok(()));
    assert_eq!(
        pm.detach(parent, child),
        Err(PidError::InvalidArgument(InvalidReason::Detached))
    );
}

#[test]
fn test_exit_disowns_children() {
    let pm = PidManager::bootstrap();
    let parent = pm.alloc(BOOTUP_PID).unwrap();
    let running = pm.alloc(parent).unwrap();
    let zombie = pm.alloc(parent).unwrap();
    pm.exit(zombie, 5, false);
    assert!(pm.contains(zombie));

    pm.exit(parent, 0, false);

    assert_eq!(pm.parent_of(running), Ok(INVALID_PID));
    assert!(!pm.contains(zombie), "orphaned zombie must be reclaimed");
    assert!(pm.contains(parent), "parent still has a live parent of its own");
    assert_consistent(&pm);

    // Nobody is left to collect an orphan's status
    pm.exit(running, 1, false);
    assert!(!pm.contains(running));

    assert_eq!(pm.wait(BOOTUP_PID, parent), Ok(0));
    assert_eq!(pm.stats().allocated, 1);
}

#[test]
fn test_exit_auto_detaches_children() {
    let pm = PidManager::bootstrap();
    let parent = pm.alloc(BOOTUP_PID).unwrap();
    let child = pm.alloc(parent).unwrap();
    let grandchild = pm.alloc(child).unwrap();

    pm.exit(parent, 0, true);
    assert_eq!(pm.parent_of(child), Ok(INVALID_PID));
    assert_eq!(
        pm.join(BOOTUP_PID, child, None, JoinFlags::NONE),
        Err(PidError::InvalidArgument(InvalidReason::Detached))
    );
    // Grandchildren stay attached to their own parent
    assert_eq!(pm.parent_of(grandchild), Ok(child));

    pm.exit(child, 0, true);
    assert!(!pm.contains(child));
    assert_eq!(pm.parent_of(grandchild), Ok(INVALID_PID));

    pm.exit(grandchild, 0, false);
    assert!(!pm.contains(grandchild));
    assert_eq!(pm.wait(BOOTUP_PID, parent), Ok(0));
    assert_consistent(&pm);
}

#[test]
fn test_joined_child_is_not_disowned_twice() {
    let pm = small_manager();
    let parent = pm.alloc(BOOTUP_PID).unwrap();
    let child = pm.alloc(parent).unwrap();
    pm.exit(child, 0, false);
    assert_eq!(pm.wait(parent, child), Ok(0));

    // Cycle the cursor until the identifier is handed to an unrelated process;
    // the parent's stale child entry must not touch it.
    let mut other = pm.alloc(BOOTUP_PID).unwrap();
    for _ in 0..16 {
        if other == child {
            break;
        }
        pm.exit(other, 0, false);
        assert_eq!(pm.wait(BOOTUP_PID, other), Ok(0));
        other = pm.alloc(BOOTUP_PID).unwrap();
    }
    assert_eq!(other, child);

    pm.exit(parent, 0, false);
    assert_eq!(pm.parent_of(other), Ok(BOOTUP_PID));
    assert_consistent(&pm);
}

#[test]
fn test_unalloc_rolls_back() {
    let pm = PidManager::bootstrap();
    let parent = pm.alloc(BOOTUP_PID).unwrap();
    let pid = pm.alloc(parent).unwrap();
    assert_eq!(pm.stats().allocated, 3);

    pm.unalloc(parent, pid);
    assert!(!pm.contains(pid));
    assert_eq!(pm.stats().allocated, 2);
    assert_consistent(&pm);
}

#[test]
#[should_panic(expected = "non-parent")]
fn test_unalloc_by_non_parent_panics() {
    let pm = PidManager::bootstrap();
    let parent = pm.alloc(BOOTUP_PID).unwrap();
    let pid = pm.alloc(parent).unwrap();
    pm.unalloc(BOOTUP_PID, pid);
}

#[test]
#[should_panic(expected = "exited twice")]
fn test_double_exit_panics() {
    let pm = PidManager::bootstrap();
    let pid = pm.alloc(BOOTUP_PID).unwrap();
    pm.exit(pid, 0, false);
    pm.exit(pid, 0, false);
}

#[test]
fn test_many_children_stay_bounded() {
    let pm = small_manager();
    let parent = pm.alloc(BOOTUP_PID).unwrap();
    // Far more children over time than the table can hold at once
    for _ in 0..50 {
        let child = pm.alloc(parent).unwrap();
        pm.exit(child, 0, false);
        assert_eq!(pm.wait(parent, child), Ok(0));
    }
    let last = pm.alloc(parent).unwrap();
    pm.exit(parent, 0, false);
    assert_eq!(pm.parent_of(last), Ok(INVALID_PID));
    assert_consistent(&pm);
}
