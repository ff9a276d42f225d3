use super::*;

#[test]
fn test_local_video_stream_state_string() {
    let tests = vec![
        (LocalVideoStreamState::Stopped, "stopped"),
        (LocalVideoStreamState::Starting, "starting"),
        (LocalVideoStreamState::Encoding, "encoding"),
        (LocalVideoStreamState::Frozen, "frozen"),
        (LocalVideoStreamState::Failed, "failed"),
    ];

    for (state, expected_string) in tests {
        assert_eq!(state.to_string(), expected_string);
        assert_eq!(LocalVideoStreamState::from(expected_string), state);
    }
}

#[test]
fn test_remote_video_stream_state_string() {
    let tests = vec![
        (RemoteVideoStreamState::Stopped, "stopped"),
        (RemoteVideoStreamState::Starting, "starting"),
        (RemoteVideoStreamState::Decoding, "decoding"),
        (RemoteVideoStreamState::Frozen, "frozen"),
        (RemoteVideoStreamState::Failed, "failed"),
    ];

    for (state, expected_string) in tests {
        assert_eq!(state.to_string(), expected_string);
        assert_eq!(RemoteVideoStreamState::from(expected_string), state);
    }
}

#[test]
fn test_stream_phase_transitions() {
    use StreamPhase::*;
    let tests = vec![
        (Stopped, Starting, true),
        (Stopped, Active, false),
        (Stopped, Frozen, false),
        (Stopped, Failed, true),
        (Starting, Active, true),
        (Starting, Frozen, false),
        (Active, Frozen, true),
        (Frozen, Active, true),
        (Active, Starting, false),
        (Frozen, Failed, true),
        (Failed, Active, false),
        (Failed, Starting, false),
        (Failed, Stopped, true),
    ];

    for (from, to, ok) in tests {
        assert_eq!(
            from.can_transition_to(to),
            ok,
            "testCase: {from:?} -> {to:?}"
        );
    }
}

#[test]
fn test_state_machine_rejects_skipping_starting() {
    let sm: StateMachine<LocalVideoStreamState> = StateMachine::new();
    assert_eq!(sm.state(), LocalVideoStreamState::Stopped);

    let result = sm.transition(LocalVideoStreamState::Encoding, LocalVideoStreamError::Ok);
    assert_eq!(
        result,
        Err(Error::ErrInvalidLocalStateTransition {
            from: LocalVideoStreamState::Stopped,
            to: LocalVideoStreamState::Encoding,
        })
    );
    assert_eq!(sm.state(), LocalVideoStreamState::Stopped);
}

#[test]
fn test_state_machine_frozen_round_trip() -> Result<()> {
    let sm: StateMachine<RemoteVideoStreamState> = StateMachine::new();

    assert!(sm.transition(RemoteVideoStreamState::Starting, RemoteVideoStateReason::Internal)?);
    assert!(sm.transition(RemoteVideoStreamState::Decoding, RemoteVideoStateReason::Internal)?);
    assert!(sm.transition(
        RemoteVideoStreamState::Frozen,
        RemoteVideoStateReason::NetworkCongestion
    )?);
    assert_eq!(sm.current().reason, RemoteVideoStateReason::NetworkCongestion);
    assert!(sm.transition(
        RemoteVideoStreamState::Decoding,
        RemoteVideoStateReason::NetworkRecovery
    )?);
    assert!(!sm.transition(
        RemoteVideoStreamState::Decoding,
        RemoteVideoStateReason::NetworkRecovery
    )?);

    Ok(())
}

#[test]
fn test_state_machine_failed_only_leaves_through_stop() -> Result<()> {
    let sm: StateMachine<LocalVideoStreamState> = StateMachine::new();
    sm.transition(LocalVideoStreamState::Starting, LocalVideoStreamError::Ok)?;
    sm.transition(
        LocalVideoStreamState::Failed,
        LocalVideoStreamError::CaptureFailure,
    )?;

    assert!(sm
        .transition(LocalVideoStreamState::Encoding, LocalVideoStreamError::Ok)
        .is_err());
    assert!(sm.stop(LocalVideoStreamError::Ok));
    assert!(!sm.stop(LocalVideoStreamError::Ok));
    assert_eq!(sm.state(), LocalVideoStreamState::Stopped);

    Ok(())
}

#[test]
fn test_state_machine_precondition_error_is_returned() {
    let sm: StateMachine<LocalVideoStreamState> = StateMachine::new();
    let result = sm.transition_if(
        LocalVideoStreamState::Starting,
        LocalVideoStreamError::Ok,
        |_| Err(Error::ErrTrackDisabled),
    );
    assert_eq!(result, Err(Error::ErrTrackDisabled));
    assert_eq!(sm.state(), LocalVideoStreamState::Stopped);
}

#[tokio::test]
async fn test_state_machine_subscribers_see_changes() -> Result<()> {
    let sm: StateMachine<RemoteVideoStreamState> = StateMachine::new();
    let mut rx = sm.subscribe();

    sm.transition(RemoteVideoStreamState::Starting, RemoteVideoStateReason::Internal)?;
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().state, RemoteVideoStreamState::Starting);

    // rejected transitions are not published
    let _ = sm.transition(RemoteVideoStreamState::Frozen, RemoteVideoStateReason::Internal);
    assert!(!rx.has_changed().unwrap());

    sm.stop(RemoteVideoStateReason::RemoteOffline);
    rx.changed().await.unwrap();
    let change = *rx.borrow_and_update();
    assert_eq!(change.state, RemoteVideoStreamState::Stopped);
    assert_eq!(change.reason, RemoteVideoStateReason::RemoteOffline);

    Ok(())
}
