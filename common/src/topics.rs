pub const SHADOW_TOPIC_PREFIX: &str = "$aws/things";
pub const SENSORS_TOPIC_SUFFIX: &str = "sensors";

pub fn shadow_update_topic(device_id: &str) -> String {
    format!("{SHADOW_TOPIC_PREFIX}/{device_id}/shadow/update")
}

pub fn shadow_delta_topic(device_id: &str) -> String {
    format!("{SHADOW_TOPIC_PREFIX}/{device_id}/shadow/update/delta")
}

pub fn sensors_topic(device_id: &str) -> String {
    format!("{device_id}/{SENSORS_TOPIC_SUFFIX}")
}
