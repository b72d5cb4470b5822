use std::sync::Arc;

use brickwire_codec::{
    validate_exclusive, validate_range, CommandComponent, Ramp, Result, Setter, ValidationError,
    Value, WireType,
};

use super::with_layer_and_address;
use crate::bytecodes::opcode;
use crate::capability::HasLayerAndAddress;

const SPEED_RANGE: std::ops::RangeInclusive<i32> = -100..=100;
const TURN_RANGE: std::ops::RangeInclusive<i32> = -200..=200;

/// Composite movement: exactly one of time/step, exactly one of speed/power,
/// optionally a turn ratio for synchronized motor pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveRequest {
    pub time: Option<Ramp>,
    pub step: Option<Ramp>,
    pub speed: Option<i32>,
    pub power: Option<i32>,
    pub turn: Option<i32>,
    pub brake: bool,
}

impl MoveRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run for a time profile in milliseconds.
    pub fn time(mut self, time: impl Into<Ramp>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Run for a step profile in tacho degrees.
    pub fn step(mut self, step: impl Into<Ramp>) -> Self {
        self.step = Some(step.into());
        self
    }

    pub fn speed(mut self, speed: i32) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn power(mut self, power: i32) -> Self {
        self.power = Some(power);
        self
    }

    pub fn turn(mut self, turn: i32) -> Self {
        self.turn = Some(turn);
        self
    }

    pub fn brake(mut self, brake: bool) -> Self {
        self.brake = brake;
        self
    }
}

pub fn start<O>(owner: &Arc<O>) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    with_layer_and_address(owner, opcode::OUTPUT_START, None)
}

/// Stop; `brake` holds the motor in position instead of letting it coast.
pub fn stop<O>(owner: &Arc<O>, brake: bool) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    with_layer_and_address(owner, opcode::OUTPUT_STOP, None).add_parameter(WireType::Boolean, brake)
}

pub fn reset<O>(owner: &Arc<O>) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    with_layer_and_address(owner, opcode::OUTPUT_RESET, None)
}

/// Blocks the brick's command queue until the motors finish their profile.
pub fn ready<O>(owner: &Arc<O>) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    with_layer_and_address(owner, opcode::OUTPUT_READY, None)
}

/// Reply is zero when the motors are idle.
pub fn test<O>(owner: &Arc<O>, on_reply: Option<Setter<O>>) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    with_layer_and_address(owner, opcode::OUTPUT_TEST, None).add_reply(WireType::UByte, on_reply, 0)
}

pub fn clear_count<O>(owner: &Arc<O>) -> CommandComponent<O>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    with_layer_and_address(owner, opcode::OUTPUT_CLR_COUNT, None)
}

/// Tacho count of a single motor.
pub fn get_count<O>(owner: &Arc<O>, on_reply: Option<Setter<O>>) -> Result<CommandComponent<O>>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    Ok(single_motor(owner, opcode::OUTPUT_GET_COUNT, "get count")?
        .add_reply(WireType::Int, on_reply, 0))
}

/// Speed and tacho degrees of a single motor.
pub fn read<O>(
    owner: &Arc<O>,
    on_speed: Option<Setter<O>>,
    on_degrees: Option<Setter<O>>,
) -> Result<CommandComponent<O>>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    // Speed is declared DATA8 by the firmware docs, but the brick rejects the
    // request unless it is sized as an int.
    Ok(single_motor(owner, opcode::OUTPUT_READ, "read")?
        .add_reply(WireType::Int, on_speed, 0)
        .add_reply(WireType::Int, on_degrees, 0))
}

pub fn speed<O>(owner: &Arc<O>, speed: i32) -> Result<CommandComponent<O>>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    let speed = validate_range(speed, "speed", SPEED_RANGE)?;
    Ok(with_layer_and_address(owner, opcode::OUTPUT_SPEED, None)
        .add_parameter(WireType::Byte, speed as i8))
}

pub fn power<O>(owner: &Arc<O>, power: i32) -> Result<CommandComponent<O>>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    let power = validate_range(power, "power", SPEED_RANGE)?;
    Ok(with_layer_and_address(owner, opcode::OUTPUT_POWER, None)
        .add_parameter(WireType::Byte, power as i8))
}

/// 1 forward, -1 backward, 0 toggles the current direction.
pub fn polarity<O>(owner: &Arc<O>, polarity: i32) -> Result<CommandComponent<O>>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    let polarity = validate_range(polarity, "polarity", -1..=1)?;
    Ok(with_layer_and_address(owner, opcode::OUTPUT_POLARITY, None)
        .add_parameter(WireType::Byte, polarity as i8))
}

pub fn time_speed<O>(owner: &Arc<O>, speed: i32, time: impl Into<Ramp>, brake: bool) -> Result<CommandComponent<O>>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    profiled(owner, opcode::OUTPUT_TIME_SPEED, ("speed", speed), time.into(), brake)
}

pub fn time_power<O>(owner: &Arc<O>, power: i32, time: impl Into<Ramp>, brake: bool) -> Result<CommandComponent<O>>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    profiled(owner, opcode::OUTPUT_TIME_POWER, ("power", power), time.into(), brake)
}

pub fn step_speed<O>(owner: &Arc<O>, speed: i32, step: impl Into<Ramp>, brake: bool) -> Result<CommandComponent<O>>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    profiled(owner, opcode::OUTPUT_STEP_SPEED, ("speed", speed), step.into(), brake)
}

pub fn step_power<O>(owner: &Arc<O>, power: i32, step: impl Into<Ramp>, brake: bool) -> Result<CommandComponent<O>>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    profiled(owner, opcode::OUTPUT_STEP_POWER, ("power", power), step.into(), brake)
}

/// Synchronized pair moving `step` degrees with a turn ratio.
pub fn step_sync<O>(owner: &Arc<O>, speed: i32, turn: i32, step: u32, brake: bool) -> Result<CommandComponent<O>>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    synced(owner, opcode::OUTPUT_STEP_SYNC, speed, turn, step, brake)
}

/// Synchronized pair running for `time` milliseconds with a turn ratio.
pub fn time_sync<O>(owner: &Arc<O>, speed: i32, turn: i32, time: u32, brake: bool) -> Result<CommandComponent<O>>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    synced(owner, opcode::OUTPUT_TIME_SYNC, speed, turn, time, brake)
}

/// Pick the timed/stepped, speed/power or sync opcode that `request` describes.
pub fn move_request<O>(owner: &Arc<O>, request: &MoveRequest) -> Result<CommandComponent<O>>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    validate_exclusive(("time", &request.time), ("step", &request.step))?;
    validate_exclusive(("speed", &request.speed), ("power", &request.power))?;
    if request.turn.is_some() && request.speed.is_none() {
        return Err(ValidationError::Invocation("specify speed when using turn".to_string()).into());
    }
    if request.turn.is_some() && owner.address().is_power_of_two() {
        return Err(
            ValidationError::Invocation("don't specify turn on a single motor".to_string()).into(),
        );
    }

    let (by_time, profile) = match (request.time, request.step) {
        (Some(time), _) => (true, time),
        (_, Some(step)) => (false, step),
        (None, None) => unreachable!("exclusivity checked above"),
    };

    match (request.turn, request.speed, request.power) {
        (Some(turn), Some(speed), _) => {
            if profile.up != 0 || profile.down != 0 {
                return Err(ValidationError::Invocation(
                    "ramp profiles cannot be combined with turn".to_string(),
                )
                .into());
            }
            let code = if by_time {
                opcode::OUTPUT_TIME_SYNC
            } else {
                opcode::OUTPUT_STEP_SYNC
            };
            synced(owner, code, speed, turn, profile.constant, request.brake)
        }
        (None, Some(speed), _) => {
            let code = if by_time {
                opcode::OUTPUT_TIME_SPEED
            } else {
                opcode::OUTPUT_STEP_SPEED
            };
            profiled(owner, code, ("speed", speed), profile, request.brake)
        }
        (None, None, Some(power)) => {
            let code = if by_time {
                opcode::OUTPUT_TIME_POWER
            } else {
                opcode::OUTPUT_STEP_POWER
            };
            profiled(owner, code, ("power", power), profile, request.brake)
        }
        _ => unreachable!("exclusivity checked above"),
    }
}

fn single_motor<O>(owner: &Arc<O>, code: u8, action: &str) -> Result<CommandComponent<O>>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    if !owner.address().is_power_of_two() {
        return Err(
            ValidationError::Invocation(format!("don't call {action} on multiple motors")).into(),
        );
    }
    Ok(CommandComponent::new(Some(owner), code, None)
        .add_accessor_parameter(WireType::UByte, |o: &O| Value::UByte(o.layer().code()))
        .add_accessor_parameter(WireType::UByte, |o: &O| {
            Value::UByte(o.address().trailing_zeros() as u8)
        }))
}

fn profiled<O>(
    owner: &Arc<O>,
    code: u8,
    (name, level): (&'static str, i32),
    profile: Ramp,
    brake: bool,
) -> Result<CommandComponent<O>>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    let level = validate_range(level, name, SPEED_RANGE)?;
    Ok(with_layer_and_address(owner, code, None)
        .add_parameter(WireType::Byte, level as i8)
        .add_ramp_parameter(WireType::UInt, profile)
        .add_parameter(WireType::Boolean, brake))
}

fn synced<O>(
    owner: &Arc<O>,
    code: u8,
    speed: i32,
    turn: i32,
    amount: u32,
    brake: bool,
) -> Result<CommandComponent<O>>
where
    O: HasLayerAndAddress + Send + Sync + 'static,
{
    let speed = validate_range(speed, "speed", SPEED_RANGE)?;
    let turn = validate_range(turn, "turn", TURN_RANGE)?;
    Ok(with_layer_and_address(owner, code, None)
        .add_parameter(WireType::Byte, speed as i8)
        .add_parameter(WireType::Short, turn as i16)
        .add_parameter(WireType::UInt, amount)
        .add_parameter(WireType::Boolean, brake))
}

#[cfg(test)]
mod tests {
    use brickwire_codec::protocol::{ARG_CONST_1, ARG_CONST_2, ARG_CONST_4, GLOBAL_INDEX};
    use brickwire_codec::{CodecError, CommandKind, Operation};

    use super::*;
    use crate::actions::fixture::Target;
    use crate::capability::Layer;

    fn encode<O: Send + Sync + 'static>(component: &CommandComponent<O>) -> Vec<u8> {
        component
            .serialize(0, CommandKind::Direct)
            .expect("component should encode")
            .to_vec()
    }

    fn invocation(err: CodecError) -> String {
        match err {
            CodecError::Validation(ValidationError::Invocation(message)) => message,
            other => panic!("expected invocation error, got {other:?}"),
        }
    }

    #[test]
    fn start_reads_layer_and_motors_from_owner() {
        let target = Target::new(Layer::Slave1, 0x06);
        assert_eq!(
            encode(&start(&target)),
            vec![opcode::OUTPUT_START, ARG_CONST_1, 1, ARG_CONST_1, 0x06]
        );
    }

    #[test]
    fn stop_carries_brake_flag() {
        let target = Target::new(Layer::Master, 0x01);
        assert_eq!(
            encode(&stop(&target, true)),
            vec![opcode::OUTPUT_STOP, ARG_CONST_1, 0, ARG_CONST_1, 1, ARG_CONST_1, 1]
        );
    }

    #[test]
    fn get_count_uses_port_index() {
        let target = Target::new(Layer::Master, 0x04);
        let component = get_count(&target, None).expect("single motor");
        assert_eq!(
            encode(&component),
            vec![opcode::OUTPUT_GET_COUNT, ARG_CONST_1, 0, ARG_CONST_1, 2, GLOBAL_INDEX, 0]
        );
        assert_eq!(component.reply_size(), 4);
    }

    #[test]
    fn single_motor_queries_reject_sets() {
        let target = Target::new(Layer::Master, 0x06);
        assert_eq!(
            invocation(get_count(&target, None).unwrap_err()),
            "don't call get count on multiple motors"
        );
        assert_eq!(
            invocation(read(&target, None, None).unwrap_err()),
            "don't call read on multiple motors"
        );
    }

    #[test]
    fn read_declares_two_ints() {
        let target = Target::new(Layer::Master, 0x08);
        let component = read(&target, None, None).expect("single motor");
        assert_eq!(component.reply_size(), 8);
        let values = component
            .deserialize(&[10, 0, 0, 0, 0x68, 0x01, 0, 0])
            .expect("eight bytes decode");
        assert_eq!(values, vec![Value::Int(10), Value::Int(360)]);
    }

    #[test]
    fn speed_and_polarity_ranges() {
        let target = Target::new(Layer::Master, 0x01);
        assert!(speed(&target, 100).is_ok());
        assert!(speed(&target, -101).is_err());
        assert!(power(&target, 101).is_err());
        assert!(polarity(&target, -1).is_ok());
        assert!(polarity(&target, 2).is_err());
    }

    #[test]
    fn time_speed_emits_ramp() {
        let target = Target::new(Layer::Master, 0x01);
        let bytes = encode(&time_speed(&target, -50, Ramp::new(100, 1000, 200), false).expect("valid"));
        assert_eq!(
            bytes,
            vec![
                opcode::OUTPUT_TIME_SPEED,
                ARG_CONST_1, 0,
                ARG_CONST_1, 1,
                ARG_CONST_1, 0xCE,
                ARG_CONST_4, 100, 0, 0, 0,
                ARG_CONST_4, 0xE8, 0x03, 0, 0,
                ARG_CONST_4, 200, 0, 0, 0,
                ARG_CONST_1, 0
            ]
        );
    }

    #[test]
    fn move_picks_opcode() {
        let target = Target::new(Layer::Master, 0x06);
        let cases = [
            (MoveRequest::new().time(1000).speed(50), opcode::OUTPUT_TIME_SPEED),
            (MoveRequest::new().time(1000).power(50), opcode::OUTPUT_TIME_POWER),
            (MoveRequest::new().step(360).speed(50), opcode::OUTPUT_STEP_SPEED),
            (MoveRequest::new().step(360).power(50), opcode::OUTPUT_STEP_POWER),
            (MoveRequest::new().time(1000).speed(50).turn(20), opcode::OUTPUT_TIME_SYNC),
            (MoveRequest::new().step(360).speed(50).turn(-20), opcode::OUTPUT_STEP_SYNC),
        ];
        for (request, expected) in cases {
            let component = move_request(&target, &request).expect("request is valid");
            assert_eq!(component.opcode(), expected, "{request:?}");
        }
    }

    #[test]
    fn move_sync_layout() {
        let target = Target::new(Layer::Master, 0x06);
        let request = MoveRequest::new().step(720).speed(30).turn(-200).brake(true);
        assert_eq!(
            encode(&move_request(&target, &request).expect("request is valid")),
            vec![
                opcode::OUTPUT_STEP_SYNC,
                ARG_CONST_1, 0,
                ARG_CONST_1, 6,
                ARG_CONST_1, 30,
                ARG_CONST_2, 0x38, 0xFF,
                ARG_CONST_4, 0xD0, 0x02, 0, 0,
                ARG_CONST_1, 1
            ]
        );
    }

    #[test]
    fn move_exclusivity_rules() {
        let pair = Target::new(Layer::Master, 0x06);
        let single = Target::new(Layer::Master, 0x01);

        let err = move_request(&pair, &MoveRequest::new().speed(10)).unwrap_err();
        assert_eq!(err.to_string(), "specify time or step (but not both)");

        let err = move_request(&pair, &MoveRequest::new().time(1).step(1).speed(10)).unwrap_err();
        assert_eq!(err.to_string(), "specify time or step (but not both)");

        let err = move_request(&pair, &MoveRequest::new().time(1).speed(10).power(10)).unwrap_err();
        assert_eq!(err.to_string(), "specify speed or power (but not both)");

        let err = move_request(&pair, &MoveRequest::new().time(1).power(10).turn(5)).unwrap_err();
        assert_eq!(invocation(err), "specify speed when using turn");

        let err = move_request(&single, &MoveRequest::new().time(1).speed(10).turn(5)).unwrap_err();
        assert_eq!(invocation(err), "don't specify turn on a single motor");

        let err = move_request(&pair, &MoveRequest::new().time(1).speed(101)).unwrap_err();
        assert_eq!(err.to_string(), "speed should be between -100 and 100 (got 101)");

        let err = move_request(&pair, &MoveRequest::new().time(1).speed(10).turn(201)).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Validation(ValidationError::OutOfRange { name: "turn", .. })
        ));

        let ramped = MoveRequest::new().time(Ramp::new(1, 2, 3)).speed(10).turn(5);
        assert!(move_request(&pair, &ramped).is_err());
    }
}
