use chronobft_core_driver::{Driver, Error, Input};
use chronobft_core_state_machine::state::{RoundValue, Step};
use chronobft_core_types::{
    NilOrVal, Round, SignedVote, Timeliness, Timeout, Timestamp, Validity,
};
use chronobft_test::utils::validators::make_validators;
use chronobft_test::{Height, Signature, TestContext, ValidatorSet, Value, Vote};

use crate::utils::*;

fn block(data: u64) -> Value {
    Value::new(data).with_time(Timestamp::from_unix_millis(1_000))
}

#[test]
fn driver_steps_proposer() {
    let value = block(9999);

    let [(v0, _), (v1, _), (v2, _), (v3, _)] = make_validators([1, 1, 1, 1]);
    let my_addr = v0.address;

    let vs = ValidatorSet::new([v0, v1.clone(), v2.clone(), v3]);
    let mut driver = Driver::<TestContext>::new(Height::new(1), vs, my_addr, Default::default());

    let r0 = Round::new(0);
    let decided = proposal(r0, value, Round::Nil, my_addr);

    let steps = vec![
        TestStep {
            desc: "Start round 0, we are proposer, ask for a value to propose",
            input: Some(new_round_input(r0, my_addr)),
            expected_outputs: vec![start_propose_timer_output(r0), get_value_output(r0)],
            expected_round: r0,
            new_state: state(r0, Step::Propose),
        },
        TestStep {
            desc: "Feed a value to propose, propose that value",
            input: Some(Input::ProposeValue(r0, value)),
            expected_outputs: vec![proposal_output(r0, value, Round::Nil, my_addr)],
            expected_round: r0,
            new_state: state(r0, Step::Propose),
        },
        TestStep {
            desc: "Receive our own proposal, prevote it (v0)",
            input: None,
            expected_outputs: vec![prevote_output(r0, NilOrVal::Val(value), &my_addr)],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "Receive our own prevote",
            input: None,
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "v1 prevotes our proposal",
            input: Some(prevote_input(r0, NilOrVal::Val(value), &v1.address)),
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "v2 prevotes our proposal, we get a polka, precommit and lock",
            input: Some(prevote_input(r0, NilOrVal::Val(value), &v2.address)),
            expected_outputs: vec![precommit_output(r0, NilOrVal::Val(value), &my_addr)],
            expected_round: r0,
            new_state: state_locked_and_valid(r0, Step::Precommit, value, r0),
        },
        TestStep {
            desc: "Receive our own precommit",
            input: None,
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state_locked_and_valid(r0, Step::Precommit, value, r0),
        },
        TestStep {
            desc: "v1 precommits our proposal",
            input: Some(precommit_input(r0, NilOrVal::Val(value), &v1.address)),
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state_locked_and_valid(r0, Step::Precommit, value, r0),
        },
        TestStep {
            desc: "v2 precommits our proposal, we decide",
            input: Some(precommit_input(r0, NilOrVal::Val(value), &v2.address)),
            expected_outputs: vec![decide_output(r0, decided)],
            expected_round: r0,
            new_state: decided_state(r0, value, r0),
        },
    ];

    run_steps(&mut driver, steps);

    assert_eq!(driver.decided_value(), Some((r0, value)));
}

#[test]
fn driver_steps_not_proposer_timeout_multiple_rounds() {
    let [(v0, _), (v1, _), (v2, _), (v3, _)] = make_validators([1, 1, 1, 1]);
    let my_addr = v0.address;

    let vs = ValidatorSet::new([v0, v1.clone(), v2.clone(), v3]);
    let mut driver = Driver::<TestContext>::new(Height::new(1), vs, my_addr, Default::default());

    let r0 = Round::new(0);
    let r1 = Round::new(1);

    let steps = vec![
        TestStep {
            desc: "Start round 0, v1 is proposer, start the propose timer",
            input: Some(new_round_input(r0, v1.address)),
            expected_outputs: vec![start_propose_timer_output(r0)],
            expected_round: r0,
            new_state: state(r0, Step::Propose),
        },
        TestStep {
            desc: "No proposal before the timeout, prevote nil",
            input: Some(timeout_propose_input(r0)),
            expected_outputs: vec![prevote_output(r0, NilOrVal::Nil, &my_addr)],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "Receive our own prevote",
            input: None,
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "v1 prevotes nil",
            input: Some(prevote_input(r0, NilOrVal::Nil, &v1.address)),
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "v2 prevotes nil, we get a nil polka, precommit nil",
            input: Some(prevote_input(r0, NilOrVal::Nil, &v2.address)),
            expected_outputs: vec![precommit_output(r0, NilOrVal::Nil, &my_addr)],
            expected_round: r0,
            new_state: state(r0, Step::Precommit),
        },
        TestStep {
            desc: "Receive our own precommit",
            input: None,
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state(r0, Step::Precommit),
        },
        TestStep {
            desc: "v1 precommits nil",
            input: Some(precommit_input(r0, NilOrVal::Nil, &v1.address)),
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state(r0, Step::Precommit),
        },
        TestStep {
            desc: "v2 precommits nil, start the precommit timer",
            input: Some(precommit_input(r0, NilOrVal::Nil, &v2.address)),
            expected_outputs: vec![start_precommit_timer_output(r0)],
            expected_round: r0,
            new_state: state(r0, Step::Precommit),
        },
        TestStep {
            desc: "Precommit timeout, move to round 1",
            input: Some(timeout_precommit_input(r0)),
            expected_outputs: vec![new_round_output(r1)],
            expected_round: r1,
            new_state: state(r1, Step::Unstarted),
        },
        TestStep {
            desc: "Start round 1, we are proposer, ask for a value to propose",
            input: Some(new_round_input(r1, my_addr)),
            expected_outputs: vec![start_propose_timer_output(r1), get_value_output(r1)],
            expected_round: r1,
            new_state: state(r1, Step::Propose),
        },
    ];

    run_steps(&mut driver, steps);
}

#[test]
fn driver_steps_prevote_timeout() {
    let value = block(9999);

    let [(v0, _), (v1, _), (v2, _), (v3, _)] = make_validators([1, 1, 1, 1]);
    let my_addr = v0.address;

    let vs = ValidatorSet::new([v0, v1.clone(), v2.clone(), v3]);
    let mut driver = Driver::<TestContext>::new(Height::new(1), vs, my_addr, Default::default());

    let r0 = Round::new(0);

    let steps = vec![
        TestStep {
            desc: "Start round 0, v1 is proposer, start the propose timer",
            input: Some(new_round_input(r0, v1.address)),
            expected_outputs: vec![start_propose_timer_output(r0)],
            expected_round: r0,
            new_state: state(r0, Step::Propose),
        },
        TestStep {
            desc: "Receive a timely proposal from v1, prevote it",
            input: Some(proposal_input(
                r0,
                value,
                Round::Nil,
                Validity::Valid,
                Timeliness::Timely,
                v1.address,
            )),
            expected_outputs: vec![prevote_output(r0, NilOrVal::Val(value), &my_addr)],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "Receive our own prevote",
            input: None,
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "v1 prevotes nil",
            input: Some(prevote_input(r0, NilOrVal::Nil, &v1.address)),
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "v2 prevotes the proposal, a quorum of prevotes for anything, start the prevote timer",
            input: Some(prevote_input(r0, NilOrVal::Val(value), &v2.address)),
            expected_outputs: vec![start_prevote_timer_output(r0)],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "Prevote timeout, precommit nil",
            input: Some(timeout_prevote_input(r0)),
            expected_outputs: vec![precommit_output(r0, NilOrVal::Nil, &my_addr)],
            expected_round: r0,
            new_state: state(r0, Step::Precommit),
        },
    ];

    run_steps(&mut driver, steps);
}

// Timeliness only decides the first prevote, a polka for an untimely
// proposal still leads to a decision on it.
#[test]
fn driver_steps_untimely_proposal() {
    let value = block(42);

    let [(v0, _), (v1, _), (v2, _), (v3, _)] = make_validators([1, 1, 1, 1]);
    let my_addr = v0.address;

    let vs = ValidatorSet::new([v0, v1.clone(), v2.clone(), v3.clone()]);
    let mut driver = Driver::<TestContext>::new(Height::new(1), vs, my_addr, Default::default());

    let r0 = Round::new(0);

    let steps = vec![
        TestStep {
            desc: "Start round 0, v1 is proposer, start the propose timer",
            input: Some(new_round_input(r0, v1.address)),
            expected_outputs: vec![start_propose_timer_output(r0)],
            expected_round: r0,
            new_state: state(r0, Step::Propose),
        },
        TestStep {
            desc: "Receive a valid but untimely proposal from v1, prevote nil",
            input: Some(proposal_input(
                r0,
                value,
                Round::Nil,
                Validity::Valid,
                Timeliness::Untimely,
                v1.address,
            )),
            expected_outputs: vec![prevote_output(r0, NilOrVal::Nil, &my_addr)],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "v1 prevotes the proposal",
            input: Some(prevote_input(r0, NilOrVal::Val(value), &v1.address)),
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "v2 prevotes the proposal",
            input: Some(prevote_input(r0, NilOrVal::Val(value), &v2.address)),
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "v3 prevotes the proposal, we get a polka, precommit and lock",
            input: Some(prevote_input(r0, NilOrVal::Val(value), &v3.address)),
            expected_outputs: vec![precommit_output(r0, NilOrVal::Val(value), &my_addr)],
            expected_round: r0,
            new_state: state_locked_and_valid(r0, Step::Precommit, value, r0),
        },
        TestStep {
            desc: "v1 precommits the proposal",
            input: Some(precommit_input(r0, NilOrVal::Val(value), &v1.address)),
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state_locked_and_valid(r0, Step::Precommit, value, r0),
        },
        TestStep {
            desc: "v2 precommits the proposal",
            input: Some(precommit_input(r0, NilOrVal::Val(value), &v2.address)),
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state_locked_and_valid(r0, Step::Precommit, value, r0),
        },
        TestStep {
            desc: "v3 precommits the proposal, we decide",
            input: Some(precommit_input(r0, NilOrVal::Val(value), &v3.address)),
            expected_outputs: vec![decide_output(
                r0,
                proposal(r0, value, Round::Nil, v1.address),
            )],
            expected_round: r0,
            new_state: decided_state(r0, value, r0),
        },
    ];

    run_steps(&mut driver, steps);
}

#[test]
fn driver_steps_invalid_proposal() {
    let value = block(42);

    let [(v0, _), (v1, _), (v2, _), (v3, _)] = make_validators([1, 1, 1, 1]);
    let my_addr = v0.address;

    let vs = ValidatorSet::new([v0, v1.clone(), v2, v3]);
    let mut driver = Driver::<TestContext>::new(Height::new(1), vs, my_addr, Default::default());

    let r0 = Round::new(0);

    let steps = vec![
        TestStep {
            desc: "Start round 0, v1 is proposer, start the propose timer",
            input: Some(new_round_input(r0, v1.address)),
            expected_outputs: vec![start_propose_timer_output(r0)],
            expected_round: r0,
            new_state: state(r0, Step::Propose),
        },
        TestStep {
            desc: "Receive an invalid proposal from v1, prevote nil",
            input: Some(proposal_input(
                r0,
                value,
                Round::Nil,
                Validity::Invalid,
                Timeliness::Timely,
                v1.address,
            )),
            expected_outputs: vec![prevote_output(r0, NilOrVal::Nil, &my_addr)],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
    ];

    run_steps(&mut driver, steps);
}

// Locked on a value in round 0, a proposal for another value in round 1
// without a proof of lock gets a nil prevote.
#[test]
fn driver_steps_locked_value() {
    let locked = block(1);
    let other = block(2);

    let [(v0, _), (v1, _), (v2, _), (v3, _)] = make_validators([1, 1, 1, 1]);
    let my_addr = v0.address;

    let vs = ValidatorSet::new([v0, v1.clone(), v2.clone(), v3.clone()]);
    let mut driver = Driver::<TestContext>::new(Height::new(1), vs, my_addr, Default::default());

    let r0 = Round::new(0);
    let r1 = Round::new(1);

    let steps = vec![
        TestStep {
            desc: "Start round 0, v1 is proposer, start the propose timer",
            input: Some(new_round_input(r0, v1.address)),
            expected_outputs: vec![start_propose_timer_output(r0)],
            expected_round: r0,
            new_state: state(r0, Step::Propose),
        },
        TestStep {
            desc: "Receive a proposal from v1, prevote it",
            input: Some(proposal_input(
                r0,
                locked,
                Round::Nil,
                Validity::Valid,
                Timeliness::Timely,
                v1.address,
            )),
            expected_outputs: vec![prevote_output(r0, NilOrVal::Val(locked), &my_addr)],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "Receive our own prevote",
            input: None,
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "v1 prevotes the proposal",
            input: Some(prevote_input(r0, NilOrVal::Val(locked), &v1.address)),
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "v2 prevotes the proposal, we get a polka, precommit and lock",
            input: Some(prevote_input(r0, NilOrVal::Val(locked), &v2.address)),
            expected_outputs: vec![precommit_output(r0, NilOrVal::Val(locked), &my_addr)],
            expected_round: r0,
            new_state: state_locked_and_valid(r0, Step::Precommit, locked, r0),
        },
        TestStep {
            desc: "v1 precommits nil",
            input: Some(precommit_input(r0, NilOrVal::Nil, &v1.address)),
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state_locked_and_valid(r0, Step::Precommit, locked, r0),
        },
        TestStep {
            desc: "v2 precommits nil",
            input: Some(precommit_input(r0, NilOrVal::Nil, &v2.address)),
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state_locked_and_valid(r0, Step::Precommit, locked, r0),
        },
        TestStep {
            desc: "v3 precommits nil, start the precommit timer",
            input: Some(precommit_input(r0, NilOrVal::Nil, &v3.address)),
            expected_outputs: vec![start_precommit_timer_output(r0)],
            expected_round: r0,
            new_state: state_locked_and_valid(r0, Step::Precommit, locked, r0),
        },
        TestStep {
            desc: "Precommit timeout, move to round 1",
            input: Some(timeout_precommit_input(r0)),
            expected_outputs: vec![new_round_output(r1)],
            expected_round: r1,
            new_state: state_locked_and_valid(r1, Step::Unstarted, locked, r0),
        },
        TestStep {
            desc: "Start round 1, v2 is proposer, start the propose timer",
            input: Some(new_round_input(r1, v2.address)),
            expected_outputs: vec![start_propose_timer_output(r1)],
            expected_round: r1,
            new_state: state_locked_and_valid(r1, Step::Propose, locked, r0),
        },
        TestStep {
            desc: "Receive a proposal for another value from v2, prevote nil",
            input: Some(proposal_input(
                r1,
                other,
                Round::Nil,
                Validity::Valid,
                Timeliness::Timely,
                v2.address,
            )),
            expected_outputs: vec![prevote_output(r1, NilOrVal::Nil, &my_addr)],
            expected_round: r1,
            new_state: state_locked_and_valid(r1, Step::Prevote, locked, r0),
        },
    ];

    run_steps(&mut driver, steps);
}

#[test]
fn driver_steps_proposer_reproposes_valid_value() {
    let value = block(7);

    let [(v0, _), (v1, _), (v2, _), (v3, _)] = make_validators([1, 1, 1, 1]);
    let my_addr = v0.address;

    let vs = ValidatorSet::new([v0, v1.clone(), v2.clone(), v3.clone()]);
    let mut driver = Driver::<TestContext>::new(Height::new(1), vs, my_addr, Default::default());

    let r0 = Round::new(0);
    let r1 = Round::new(1);

    let steps = vec![
        TestStep {
            desc: "Start round 0, v1 is proposer, start the propose timer",
            input: Some(new_round_input(r0, v1.address)),
            expected_outputs: vec![start_propose_timer_output(r0)],
            expected_round: r0,
            new_state: state(r0, Step::Propose),
        },
        TestStep {
            desc: "Receive a proposal from v1, prevote it",
            input: Some(proposal_input(
                r0,
                value,
                Round::Nil,
                Validity::Valid,
                Timeliness::Timely,
                v1.address,
            )),
            expected_outputs: vec![prevote_output(r0, NilOrVal::Val(value), &my_addr)],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "Receive our own prevote",
            input: None,
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "v1 prevotes the proposal",
            input: Some(prevote_input(r0, NilOrVal::Val(value), &v1.address)),
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state(r0, Step::Prevote),
        },
        TestStep {
            desc: "v2 prevotes the proposal, we get a polka, precommit and lock",
            input: Some(prevote_input(r0, NilOrVal::Val(value), &v2.address)),
            expected_outputs: vec![precommit_output(r0, NilOrVal::Val(value), &my_addr)],
            expected_round: r0,
            new_state: state_locked_and_valid(r0, Step::Precommit, value, r0),
        },
        TestStep {
            desc: "v2 precommits nil at round 1",
            input: Some(precommit_input(r1, NilOrVal::Nil, &v2.address)),
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state_locked_and_valid(r0, Step::Precommit, value, r0),
        },
        TestStep {
            desc: "v3 precommits nil at round 1, f+1 voters ahead of us, skip to round 1",
            input: Some(precommit_input(r1, NilOrVal::Nil, &v3.address)),
            expected_outputs: vec![new_round_output(r1)],
            expected_round: r1,
            new_state: state_locked_and_valid(r1, Step::Unstarted, value, r0),
        },
        TestStep {
            desc: "Start round 1, we are proposer, propose the valid value with its proof of lock round",
            input: Some(new_round_input(r1, my_addr)),
            expected_outputs: vec![proposal_output(r1, value, r0, my_addr)],
            expected_round: r1,
            new_state: state_locked_and_valid(r1, Step::Propose, value, r0),
        },
    ];

    run_steps(&mut driver, steps);
}

#[test]
fn driver_steps_skip_round_skip_threshold() {
    let [(v0, _), (v1, _), (v2, _), (v3, _)] = make_validators([1, 1, 1, 1]);
    let my_addr = v0.address;

    let vs = ValidatorSet::new([v0, v1.clone(), v2.clone(), v3]);
    let mut driver = Driver::<TestContext>::new(Height::new(1), vs, my_addr, Default::default());

    let r0 = Round::new(0);
    let r2 = Round::new(2);
    let value = block(3);

    let steps = vec![
        TestStep {
            desc: "Start round 0, v1 is proposer, start the propose timer",
            input: Some(new_round_input(r0, v1.address)),
            expected_outputs: vec![start_propose_timer_output(r0)],
            expected_round: r0,
            new_state: state(r0, Step::Propose),
        },
        TestStep {
            desc: "v1 prevotes for round 2",
            input: Some(prevote_input(r2, NilOrVal::Val(value), &v1.address)),
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state(r0, Step::Propose),
        },
        TestStep {
            desc: "v2 prevotes for round 2, f+1 voters ahead of us, skip to round 2",
            input: Some(prevote_input(r2, NilOrVal::Nil, &v2.address)),
            expected_outputs: vec![new_round_output(r2)],
            expected_round: r2,
            new_state: state(r2, Step::Unstarted),
        },
    ];

    run_steps(&mut driver, steps);
}

#[test]
fn driver_ignores_proposer_wait_timeout() {
    let [(v0, _), (v1, _), (v2, _), (v3, _)] = make_validators([1, 1, 1, 1]);
    let my_addr = v0.address;

    let vs = ValidatorSet::new([v0, v1, v2, v3]);
    let mut driver = Driver::<TestContext>::new(Height::new(1), vs, my_addr, Default::default());

    let r0 = Round::new(0);

    let steps = vec![
        TestStep {
            desc: "Start round 0, we are proposer, ask for a value to propose",
            input: Some(new_round_input(r0, my_addr)),
            expected_outputs: vec![start_propose_timer_output(r0), get_value_output(r0)],
            expected_round: r0,
            new_state: state(r0, Step::Propose),
        },
        TestStep {
            desc: "The proposer wait timer elapses, nothing happens",
            input: Some(Input::TimeoutElapsed(Timeout::proposer_wait(r0))),
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state(r0, Step::Propose),
        },
    ];

    run_steps(&mut driver, steps);
}

#[test]
fn driver_steps_no_proposer() {
    let [(v0, _), (v1, _), (v2, _), (v3, _)] = make_validators([1, 1, 1, 1]);

    let vs = ValidatorSet::new([v0.clone(), v1, v2, v3]);
    let mut driver =
        Driver::<TestContext>::new(Height::new(1), vs, v0.address, Default::default());

    let steps = vec![TestStep {
        desc: "Propose timeout before any round started",
        input: Some(timeout_propose_input(Round::new(0))),
        expected_outputs: vec![],
        expected_round: Round::Nil,
        new_state: state(Round::Nil, Step::Unstarted),
    }];

    run_steps_failing(
        &mut driver,
        steps,
        Error::NoProposer(Height::new(1), Round::Nil),
    );
}

#[test]
fn driver_steps_proposer_not_found() {
    let [(v0, _), (v1, _), (v2, _), (v3, _), (stranger, _)] = make_validators([1, 1, 1, 1, 1]);

    let vs = ValidatorSet::new([v0.clone(), v1, v2, v3]);
    let mut driver =
        Driver::<TestContext>::new(Height::new(1), vs, v0.address, Default::default());

    let steps = vec![TestStep {
        desc: "Start round 0 with a proposer outside the validator set",
        input: Some(new_round_input(Round::new(0), stranger.address)),
        expected_outputs: vec![],
        expected_round: Round::new(0),
        new_state: state(Round::new(0), Step::Unstarted),
    }];

    run_steps_failing(
        &mut driver,
        steps,
        Error::ProposerNotFound(stranger.address),
    );
}

#[test]
fn driver_steps_validator_not_found() {
    let [(v0, _), (v1, _), (v2, _), (v3, _), (stranger, _)] = make_validators([1, 1, 1, 1, 1]);
    let my_addr = v0.address;

    let vs = ValidatorSet::new([v0, v1.clone(), v2, v3]);
    let mut driver = Driver::<TestContext>::new(Height::new(1), vs, my_addr, Default::default());

    let r0 = Round::new(0);

    let steps = vec![
        TestStep {
            desc: "Start round 0, v1 is proposer, start the propose timer",
            input: Some(new_round_input(r0, v1.address)),
            expected_outputs: vec![start_propose_timer_output(r0)],
            expected_round: r0,
            new_state: state(r0, Step::Propose),
        },
        TestStep {
            desc: "Receive a prevote from a validator outside the set",
            input: Some(prevote_input(r0, NilOrVal::Nil, &stranger.address)),
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state(r0, Step::Propose),
        },
    ];

    run_steps_failing(
        &mut driver,
        steps,
        Error::ValidatorNotFound(stranger.address),
    );
}

#[test]
fn driver_steps_vote_for_other_height() {
    let [(v0, _), (v1, _), (v2, _), (v3, _)] = make_validators([1, 1, 1, 1]);
    let my_addr = v0.address;

    let vs = ValidatorSet::new([v0, v1.clone(), v2, v3]);
    let mut driver = Driver::<TestContext>::new(Height::new(1), vs, my_addr, Default::default());

    let r0 = Round::new(0);
    let vote = Vote::new_prevote(Height::new(2), r0, NilOrVal::Nil, v1.address);

    let steps = vec![
        TestStep {
            desc: "Start round 0, v1 is proposer, start the propose timer",
            input: Some(new_round_input(r0, v1.address)),
            expected_outputs: vec![start_propose_timer_output(r0)],
            expected_round: r0,
            new_state: state(r0, Step::Propose),
        },
        TestStep {
            desc: "Receive a prevote for height 2",
            input: Some(Input::Vote(SignedVote::new(vote, Signature::test()))),
            expected_outputs: vec![],
            expected_round: r0,
            new_state: state(r0, Step::Propose),
        },
    ];

    run_steps_failing(
        &mut driver,
        steps,
        Error::InvalidVoteHeight {
            vote_height: Height::new(2),
            consensus_height: Height::new(1),
        },
    );
}

#[test]
fn driver_restores_locked_value_across_restart() {
    let locked = block(1);
    let other = block(2);

    let [(v0, _), (v1, _), (v2, _), (v3, _)] = make_validators([1, 1, 1, 1]);
    let my_addr = v0.address;

    let vs = ValidatorSet::new([v0, v1, v2.clone(), v3]);
    let mut driver = Driver::<TestContext>::new(Height::new(1), vs, my_addr, Default::default());

    let r0 = Round::new(0);
    let r1 = Round::new(1);

    driver.restore(
        Some(RoundValue::new(locked, r0)),
        Some(RoundValue::new(locked, r0)),
    );

    let steps = vec![
        TestStep {
            desc: "Resume at round 1, v2 is proposer, start the propose timer",
            input: Some(new_round_input(r1, v2.address)),
            expected_outputs: vec![start_propose_timer_output(r1)],
            expected_round: r1,
            new_state: state_locked_and_valid(r1, Step::Propose, locked, r0),
        },
        TestStep {
            desc: "Receive a proposal for another value from v2, prevote nil",
            input: Some(proposal_input(
                r1,
                other,
                Round::Nil,
                Validity::Valid,
                Timeliness::Timely,
                v2.address,
            )),
            expected_outputs: vec![prevote_output(r1, NilOrVal::Nil, &my_addr)],
            expected_round: r1,
            new_state: state_locked_and_valid(r1, Step::Prevote, locked, r0),
        },
    ];

    run_steps(&mut driver, steps);
}
