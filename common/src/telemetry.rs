use tracing::debug;

use crate::{
    context::NodeContext,
    indicator::{Channel, Pattern},
    platform::Platform,
    scheduler::{Schedule, Task},
    topics::sensors_topic,
    types::Timestamp,
};

/// `{"Light":<int>,"Temp":<int>.<2 digits>}` with the temperature given in
/// hundredths of a degree.
pub fn sensor_payload(light: i32, temperature_centi: i32) -> String {
    let sign = if temperature_centi < 0 { "-" } else { "" };
    let magnitude = temperature_centi.unsigned_abs();
    format!(
        "{{\"Light\":{light},\"Temp\":{sign}{}.{:02}}}",
        magnitude / 100,
        magnitude % 100
    )
}

impl<P: Platform> NodeContext<P> {
    /// Publishes one sensor sample. Without an AP connection nothing is read
    /// or sent. Returns whether a publish was attempted.
    pub fn send_to_cloud(&mut self) -> bool {
        if !self.connectivity.have_ap_connection() {
            return false;
        }

        let temperature = self.platform.temperature_centi();
        let light = self.platform.light();
        let payload = sensor_payload(light, temperature);
        let topic = sensors_topic(&self.device_id);
        self.publish(&topic, &payload);

        if self.shadow.hold_count > 0 {
            self.shadow.hold_count -= 1;
        } else {
            self.platform.set_pattern(Channel::Yellow, Pattern::Blip);
        }
        true
    }

    pub fn refresh_indicators(&mut self) {
        if !self.connectivity.am_connecting_ap() {
            if self.connectivity.have_ap_connection() {
                self.platform.set_pattern(Channel::Blue, Pattern::On);
            }

            if !self.connectivity.am_connecting_socket() && self.cloud_connected() {
                self.platform.set_pattern(Channel::Green, Pattern::On);
            }
        }

        let red = if self.connectivity.have_error() {
            Pattern::On
        } else {
            Pattern::Off
        };
        self.platform.set_pattern(Channel::Red, red);
    }
}

/// Permanent periodic task: gates telemetry to the configured send interval
/// and refreshes the status indicators on every tick.
#[derive(Debug, Default)]
pub struct DataTask {
    previous_transmission: Option<Timestamp>,
}

impl<P: Platform> Task<NodeContext<P>> for DataTask {
    fn name(&self) -> &'static str {
        "data"
    }

    fn run(&mut self, ctx: &mut NodeContext<P>) -> Schedule {
        let now = ctx.platform.current_time();

        if ctx.cloud_connected() {
            let due = self.previous_transmission.map_or(true, |previous| {
                ctx.platform.elapsed(now, previous) >= ctx.config.send_interval_s
            });
            if due {
                self.previous_transmission = Some(now);
                if !ctx.send_to_cloud() {
                    debug!("telemetry skipped: no AP connection");
                }
            }
        }

        ctx.refresh_indicators();
        Schedule::Reschedule(ctx.config.data_task_interval_ms)
    }
}
