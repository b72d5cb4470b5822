use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::debug;

use brickwire_codec::{Ramp, Value};
use brickwire_transport::Connection;

use crate::actions::motor::{self as actions, MoveRequest};
use crate::brick::{reply_bool, reply_i32, Link};
use crate::capability::{HasLayer, HasLayerAndAddress, Layer};
use crate::error::Result;
use crate::ids::MotorSet;

/// Tacho speed and position of a single motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MotorReading {
    pub speed: i32,
    pub degrees: i32,
}

/// One motor or a set of motors driven together.
///
/// Creating a handle sends nothing. The handle remembers whether it was
/// started and the last speed it set, so repeated [`set_speed`](Self::set_speed)
/// calls with the same value stay off the wire.
pub struct Motor<C> {
    link: Link<C>,
    set: MotorSet,
    on: AtomicBool,
    speed: Mutex<Option<i32>>,
    busy: AtomicBool,
    count: AtomicI32,
    reading: Mutex<MotorReading>,
}

fn as_i32(value: &Value) -> i32 {
    value.as_i64().unwrap_or_default() as i32
}

impl<C: Connection + 'static> Motor<C> {
    pub(crate) fn new(link: Link<C>, set: MotorSet) -> Self {
        Self {
            link,
            set,
            on: AtomicBool::new(false),
            speed: Mutex::new(None),
            busy: AtomicBool::new(false),
            count: AtomicI32::new(0),
            reading: Mutex::new(MotorReading::default()),
        }
    }

    pub fn set(&self) -> MotorSet {
        self.set
    }

    /// True between [`start`](Self::start) and [`stop`](Self::stop).
    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    /// Last speed sent through [`set_speed`](Self::set_speed).
    pub fn speed(&self) -> Option<i32> {
        *self.speed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn start(self: &Arc<Self>) -> Result<()> {
        self.link.execute_component(actions::start(self))?;
        self.on.store(true, Ordering::SeqCst);
        debug!(motor = %self.set, "motor started");
        Ok(())
    }

    pub fn stop(self: &Arc<Self>, brake: bool) -> Result<()> {
        self.link.execute_component(actions::stop(self, brake))?;
        self.on.store(false, Ordering::SeqCst);
        debug!(motor = %self.set, brake, "motor stopped");
        Ok(())
    }

    /// Reset the tacho counters used by step profiles.
    pub fn reset(self: &Arc<Self>) -> Result<()> {
        self.link.execute_component(actions::reset(self))?;
        Ok(())
    }

    /// Hold the brick's command queue until the current profile completes.
    pub fn ready(self: &Arc<Self>) -> Result<()> {
        self.link.execute_component(actions::ready(self))?;
        Ok(())
    }

    /// True while any motor in the set is running a profile.
    pub fn is_busy(self: &Arc<Self>) -> Result<bool> {
        let command = self.link.execute_component(actions::test(
            self,
            Some(Box::new(|motor: &Self, value: &Value| {
                motor.busy.store(value.as_bool().unwrap_or(false), Ordering::SeqCst);
            })),
        ))?;
        reply_bool(&command, 0, "busy flag")
    }

    pub fn clear_count(self: &Arc<Self>) -> Result<()> {
        self.link.execute_component(actions::clear_count(self))?;
        Ok(())
    }

    /// Tacho count in degrees. Single motors only.
    pub fn count(self: &Arc<Self>) -> Result<i32> {
        let command = self.link.execute_component(actions::get_count(
            self,
            Some(Box::new(|motor: &Self, value: &Value| {
                motor.count.store(as_i32(value), Ordering::SeqCst);
            })),
        )?)?;
        reply_i32(&command, 0, "tacho count")
    }

    /// Speed and tacho degrees. Single motors only.
    pub fn read(self: &Arc<Self>) -> Result<MotorReading> {
        let command = self.link.execute_component(actions::read(
            self,
            Some(Box::new(|motor: &Self, value: &Value| {
                motor.lock_reading().speed = as_i32(value);
            })),
            Some(Box::new(|motor: &Self, value: &Value| {
                motor.lock_reading().degrees = as_i32(value);
            })),
        )?)?;
        let reading = MotorReading {
            speed: reply_i32(&command, 0, "speed")?,
            degrees: reply_i32(&command, 1, "degrees")?,
        };
        debug!(motor = %self.set, speed = reading.speed, degrees = reading.degrees, "motor read");
        Ok(reading)
    }

    /// Most recent [`read`](Self::read) result.
    pub fn last_reading(&self) -> MotorReading {
        *self.lock_reading()
    }

    /// Most recent [`count`](Self::count) result.
    pub fn last_count(&self) -> i32 {
        self.count.load(Ordering::SeqCst)
    }

    /// Regulated speed, -100..=100. Skipped when the value did not change.
    pub fn set_speed(self: &Arc<Self>, speed: i32) -> Result<()> {
        if self.speed() == Some(speed) {
            return Ok(());
        }
        self.link.execute_component(actions::speed(self, speed)?)?;
        *self.speed.lock().unwrap_or_else(PoisonError::into_inner) = Some(speed);
        Ok(())
    }

    /// Unregulated power, -100..=100.
    pub fn set_power(self: &Arc<Self>, power: i32) -> Result<()> {
        self.link.execute_component(actions::power(self, power)?)?;
        Ok(())
    }

    /// 1 forward, -1 backward.
    pub fn set_polarity(self: &Arc<Self>, polarity: i32) -> Result<()> {
        self.link.execute_component(actions::polarity(self, polarity)?)?;
        Ok(())
    }

    /// Flip the current direction.
    pub fn reverse(self: &Arc<Self>) -> Result<()> {
        self.set_polarity(0)
    }

    /// Run the composite movement described by `request`.
    pub fn move_with(self: &Arc<Self>, request: &MoveRequest) -> Result<()> {
        self.link.execute_component(actions::move_request(self, request)?)?;
        Ok(())
    }

    pub fn time_speed(self: &Arc<Self>, speed: i32, time: impl Into<Ramp>, brake: bool) -> Result<()> {
        self.link.execute_component(actions::time_speed(self, speed, time, brake)?)?;
        Ok(())
    }

    pub fn time_power(self: &Arc<Self>, power: i32, time: impl Into<Ramp>, brake: bool) -> Result<()> {
        self.link.execute_component(actions::time_power(self, power, time, brake)?)?;
        Ok(())
    }

    pub fn step_speed(self: &Arc<Self>, speed: i32, step: impl Into<Ramp>, brake: bool) -> Result<()> {
        self.link.execute_component(actions::step_speed(self, speed, step, brake)?)?;
        Ok(())
    }

    pub fn step_power(self: &Arc<Self>, power: i32, step: impl Into<Ramp>, brake: bool) -> Result<()> {
        self.link.execute_component(actions::step_power(self, power, step, brake)?)?;
        Ok(())
    }

    pub fn step_sync(self: &Arc<Self>, speed: i32, turn: i32, step: u32, brake: bool) -> Result<()> {
        self.link.execute_component(actions::step_sync(self, speed, turn, step, brake)?)?;
        Ok(())
    }

    pub fn time_sync(self: &Arc<Self>, speed: i32, turn: i32, time: u32, brake: bool) -> Result<()> {
        self.link.execute_component(actions::time_sync(self, speed, turn, time, brake)?)?;
        Ok(())
    }

    fn lock_reading(&self) -> std::sync::MutexGuard<'_, MotorReading> {
        self.reading.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C> HasLayer for Motor<C> {
    fn layer(&self) -> Layer {
        self.link.layer()
    }
}

impl<C> HasLayerAndAddress for Motor<C> {
    fn address(&self) -> u8 {
        self.set.bits()
    }
}

impl<C> fmt::Debug for Motor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Motor")
            .field("set", &self.set)
            .field("on", &self.on.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use brickwire_codec::{CodecError, ValidationError};

    use super::*;
    use crate::brick::Brick;
    use crate::bytecodes::opcode;
    use crate::error::DeviceError;
    use crate::testing::{FakeConnection, FakeReply, Script};

    fn brick() -> (Brick<FakeConnection>, Script) {
        let (connection, script) = FakeConnection::new();
        (Brick::new(connection), script)
    }

    #[test]
    fn handle_creation_sends_nothing() {
        let (brick, script) = brick();
        let motor = brick.motor(MotorSet::A);
        assert!(!motor.is_on());
        assert!(script.written().is_empty());
    }

    #[test]
    fn start_and_stop_track_state() {
        let (brick, script) = brick();
        let motors = brick.motor(MotorSet::BC);
        motors.start().expect("start should send");
        assert!(motors.is_on());
        assert_eq!(&script.last_written()[7..], &[opcode::OUTPUT_START, 0x81, 0, 0x81, 0x06]);

        motors.stop(true).expect("stop should send");
        assert!(!motors.is_on());
        assert_eq!(
            &script.last_written()[7..],
            &[opcode::OUTPUT_STOP, 0x81, 0, 0x81, 0x06, 0x81, 1]
        );
    }

    #[test]
    fn count_decodes_signed_int() {
        let (brick, script) = brick();
        script.reply(FakeReply::Ok((-360i32).to_le_bytes().to_vec()));
        let motor = brick.motor(MotorSet::C);
        assert_eq!(motor.count().expect("count should decode"), -360);
        assert_eq!(motor.last_count(), -360);
        // Single-motor opcodes address the port index, not the bit.
        assert_eq!(&script.last_written()[7..12], &[opcode::OUTPUT_GET_COUNT, 0x81, 0, 0x81, 2]);
    }

    #[test]
    fn concurrent_counts_each_return_their_own_reply() {
        let (brick, script) = brick();
        for n in 0..200i32 {
            script.reply(FakeReply::Ok(n.to_le_bytes().to_vec()));
        }
        let motor = brick.motor(MotorSet::A);

        let mut seen: Vec<i32> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..2)
                .map(|_| {
                    let motor = Arc::clone(&motor);
                    scope.spawn(move || {
                        (0..100)
                            .map(|_| motor.count().expect("count should decode"))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            workers
                .into_iter()
                .flat_map(|worker| worker.join().expect("worker should not panic"))
                .collect()
        });
        seen.sort_unstable();
        assert_eq!(seen, (0..200).collect::<Vec<_>>());
        assert_eq!(script.pending_replies(), 0);
    }

    #[test]
    fn count_on_motor_pair_is_rejected_before_sending() {
        let (brick, script) = brick();
        let err = brick.motor(MotorSet::AD).count().unwrap_err();
        assert!(matches!(
            err,
            DeviceError::Codec(CodecError::Validation(ValidationError::Invocation(_)))
        ));
        assert!(script.written().is_empty());
    }

    #[test]
    fn read_returns_speed_and_degrees() {
        let (brick, script) = brick();
        let mut payload = 42i32.to_le_bytes().to_vec();
        payload.extend_from_slice(&720i32.to_le_bytes());
        script.reply(FakeReply::Ok(payload));

        let reading = brick.motor(MotorSet::B).read().expect("read should decode");
        assert_eq!(reading, MotorReading { speed: 42, degrees: 720 });
    }

    #[test]
    fn set_speed_skips_unchanged_value() {
        let (brick, script) = brick();
        let motor = brick.motor(MotorSet::A);
        motor.set_speed(30).expect("speed should send");
        motor.set_speed(30).expect("unchanged speed is a no-op");
        motor.set_speed(-30).expect("speed should send");
        assert_eq!(script.written().len(), 2);
        assert_eq!(motor.speed(), Some(-30));
    }

    #[test]
    fn out_of_range_speed_keeps_cached_value() {
        let (brick, _script) = brick();
        let motor = brick.motor(MotorSet::A);
        assert!(motor.set_speed(101).is_err());
        assert_eq!(motor.speed(), None);
    }

    #[test]
    fn reverse_sends_toggle_polarity() {
        let (brick, script) = brick();
        brick.motor(MotorSet::D).reverse().expect("reverse should send");
        assert_eq!(
            &script.last_written()[7..],
            &[opcode::OUTPUT_POLARITY, 0x81, 0, 0x81, 0x08, 0x81, 0]
        );
    }

    #[test]
    fn is_busy_reads_test_flag() {
        let (brick, script) = brick();
        script.reply(FakeReply::Ok(vec![1]));
        assert!(brick.motor(MotorSet::ALL).is_busy().expect("test should decode"));
    }

    #[test]
    fn move_with_turn_uses_sync_opcode() {
        let (brick, script) = brick();
        let pair = brick.motor(MotorSet::BC);
        pair.move_with(&MoveRequest::new().step(360).speed(50).turn(-100))
            .expect("sync move should send");
        assert_eq!(script.last_written()[7], opcode::OUTPUT_STEP_SYNC);

        let single = brick.motor(MotorSet::B);
        assert!(single
            .move_with(&MoveRequest::new().time(1000).speed(50).turn(20))
            .is_err());
    }
}
