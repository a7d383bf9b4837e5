use tracing::{debug, error, info, warn};

use crate::{
    boot::{sample_inputs, BootMode},
    config::{NodeConfig, RuntimeConfig},
    connectivity::{ConnectionPhase, ConnectivityState},
    context::NodeContext,
    error::IdentityError,
    platform::{BootInputs, Identity, Platform},
    scheduler::{Task, TimerId, TimerRegistry},
    shadow::{ShadowInitTask, ShadowState},
    telemetry::DataTask,
    topics::shadow_delta_topic,
    types::{ToggleState, WifiMode, WifiStatus},
};

pub const TIMER_CAPACITY: usize = 8;

/// Used until (or instead of, if identity fails) the secure-element id.
pub const PLACEHOLDER_DEVICE_ID: &str = "BAAAAADD1DBAAADD1D";

pub struct Node<P> {
    ctx: NodeContext<P>,
    timers: TimerRegistry<NodeContext<P>, TIMER_CAPACITY>,
    boot_mode: BootMode,
    data_task: Option<TimerId>,
}

impl<P: Platform + 'static> Node<P> {
    /// Power-on sequence. Blocks for the input debounce window, then leaves
    /// the node with its timers armed and ready for [`Node::run_scheduler`].
    pub fn boot<I, B>(platform: P, identity: &mut I, inputs: &mut B, runtime: RuntimeConfig) -> Self
    where
        I: Identity + ?Sized,
        B: BootInputs + ?Sized,
    {
        Self::boot_with_timers(TimerRegistry::new(), platform, identity, inputs, runtime)
    }

    /// [`Node::boot`] on a registry the platform already owns. Anything armed
    /// in it before boot is dropped.
    pub fn boot_with_timers<I, B>(
        mut timers: TimerRegistry<NodeContext<P>, TIMER_CAPACITY>,
        platform: P,
        identity: &mut I,
        inputs: &mut B,
        mut runtime: RuntimeConfig,
    ) -> Self
    where
        I: Identity + ?Sized,
        B: BootInputs + ?Sized,
    {
        runtime.sanitize();

        if !timers.is_empty() {
            debug!("dropping {} timers armed before boot", timers.len());
        }
        timers.flush_all();

        let sample = sample_inputs(inputs, runtime.node.debounce_iterations);

        let mut ctx = NodeContext::new(
            platform,
            PLACEHOLDER_DEVICE_ID.to_string(),
            runtime.node.clone(),
        );
        ctx.platform.self_test();

        if let Err(err) = identity.init() {
            log_identity_failure(err);
            ctx.connectivity.mark_error();
        }
        match identity.device_id() {
            Ok(device_id) => ctx.device_id = device_id,
            Err(err) => {
                log_identity_failure(err);
                ctx.connectivity.mark_error();
            }
        }
        info!("device id: {}", ctx.device_id);

        let mut node = Self {
            ctx,
            timers,
            boot_mode: BootMode::select(sample),
            data_task: None,
        };

        let interval = node.ctx.config.shadow_init_interval_ms;
        node.arm(Box::new(ShadowInitTask::default()), interval);

        let mode = node.boot_mode;
        info!("boot mode: {}", mode.as_str());
        mode.show(&mut node.ctx.platform);
        mode.apply(&mut node.ctx.connectivity);
        node.ctx
            .platform
            .wifi_init(mode.wifi_mode(), mode.credentials(&runtime.network));

        if mode.wifi_mode() == WifiMode::Station {
            node.start_cloud();
        }

        node.ctx.platform.self_test();
        node.subscribe_to_cloud();
        node
    }

    /// Called once SoftAP provisioning has stored credentials.
    pub fn post_provisioning(&mut self) {
        info!("provisioning complete");
        self.start_cloud();
    }

    /// One scheduler pass at the platform's current time.
    pub fn run_scheduler(&mut self) -> usize {
        let now_ms = self.ctx.platform.monotonic_ms();
        self.timers.call_next_callback(&mut self.ctx, now_ms)
    }

    pub fn wifi_connection_state_changed(&mut self, status: WifiStatus) {
        info!("wifi status: {status:?}");
        if self.ctx.connectivity.apply_wifi_status(status) {
            self.ctx.platform.set_init_flag();
        }
    }

    pub fn set_connecting_socket(&mut self, connecting: bool) {
        self.ctx.connectivity.set_connecting_socket(connecting);
    }

    pub fn received_from_cloud(&mut self, topic: &str, payload: &[u8]) -> Option<ToggleState> {
        self.ctx.received_from_cloud(topic, payload)
    }

    pub fn update_device_shadow(&mut self) -> bool {
        self.ctx.update_device_shadow()
    }

    pub fn send_to_cloud(&mut self) -> bool {
        self.ctx.send_to_cloud()
    }

    pub fn boot_mode(&self) -> BootMode {
        self.boot_mode
    }

    pub fn connectivity(&self) -> &ConnectivityState {
        &self.ctx.connectivity
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.ctx.connectivity.phase(self.ctx.cloud_connected())
    }

    pub fn shadow(&self) -> ShadowState {
        self.ctx.shadow
    }

    pub fn device_id(&self) -> &str {
        &self.ctx.device_id
    }

    pub fn config(&self) -> &NodeConfig {
        &self.ctx.config
    }

    pub fn armed_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn platform(&self) -> &P {
        &self.ctx.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.ctx.platform
    }

    fn start_cloud(&mut self) {
        self.ctx.platform.setup_task(&self.ctx.device_id);
        self.arm_data_task();
    }

    fn subscribe_to_cloud(&mut self) {
        let topic = shadow_delta_topic(&self.ctx.device_id);
        self.ctx.platform.register_subscription(&topic);
    }

    fn arm_data_task(&mut self) {
        let now_ms = self.ctx.platform.monotonic_ms();
        let interval = self.ctx.config.data_task_interval_ms;

        if let Some(id) = self.data_task {
            if self.timers.rearm(id, interval, now_ms).is_ok() {
                return;
            }
        }
        self.data_task = self.arm(Box::new(DataTask::default()), interval);
    }

    fn arm(
        &mut self,
        task: Box<dyn Task<NodeContext<P>>>,
        interval_ms: u64,
    ) -> Option<TimerId> {
        let name = task.name();
        let now_ms = self.ctx.platform.monotonic_ms();
        match self.timers.create(task, interval_ms, now_ms) {
            Ok(id) => Some(id),
            Err(err) => {
                warn!("{name} task not scheduled: {err}");
                None
            }
        }
    }
}

fn log_identity_failure(err: IdentityError) {
    error!("APP: {err}");
}
