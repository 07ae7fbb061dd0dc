/// Vulkan Debug Messenger - routes validation layer messages to the engine logger
///
/// Only compiled with the `vulkan-validation` feature. Messages are filtered by
/// the configured `DebugSeverity`, counted, and logged under the
/// `inflight::vulkan::validation` source.

use ash::vk;
use colored::*;
use inflight_engine::inflight::DebugSeverity;
use inflight_engine::{inflight_error, inflight_info, inflight_trace, inflight_warn};
use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

const SOURCE: &str = "inflight::vulkan::validation";

/// Global severity filter (None = no messenger active)
static DEBUG_SEVERITY: Mutex<Option<DebugSeverity>> = Mutex::new(None);

/// Message counters, indexed by `Bucket`
static COUNTERS: [AtomicU32; 4] = [AtomicU32::new(0), AtomicU32::new(0), AtomicU32::new(0), AtomicU32::new(0)];

/// Occurrence count per message id, for the report
static MESSAGE_COUNTS: Mutex<Option<FxHashMap<String, u32>>> = Mutex::new(None);

/// Snapshot of validation message counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Error = 0,
    Warning = 1,
    Info = 2,
    Verbose = 3,
}

impl Bucket {
    /// Most severe bit wins when a message carries several
    fn of(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> Bucket {
        if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            Bucket::Error
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            Bucket::Warning
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            Bucket::Info
        } else {
            Bucket::Verbose
        }
    }

    fn bump(self) {
        COUNTERS[self as usize].fetch_add(1, Ordering::Relaxed);
    }
}

/// Install the severity filter and reset counters
pub(crate) fn init_debug_config(severity: DebugSeverity) {
    for counter in &COUNTERS {
        counter.store(0, Ordering::Relaxed);
    }
    if let Ok(mut counts) = MESSAGE_COUNTS.lock() {
        *counts = Some(FxHashMap::default());
    }
    if let Ok(mut current) = DEBUG_SEVERITY.lock() {
        *current = Some(severity);
    }
}

/// Stop forwarding messages (called before the messenger is destroyed)
pub(crate) fn cleanup_debug_config() {
    if let Ok(mut current) = DEBUG_SEVERITY.lock() {
        *current = None;
    }
}

/// Messenger severity mask for a filter level
pub(crate) fn severity_flags(severity: DebugSeverity) -> vk::DebugUtilsMessageSeverityFlagsEXT {
    match severity {
        DebugSeverity::ErrorsOnly => vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        DebugSeverity::ErrorsAndWarnings => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        }
        DebugSeverity::All => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        }
    }
}

pub fn validation_stats() -> ValidationStats {
    let load = |bucket: Bucket| COUNTERS[bucket as usize].load(Ordering::Relaxed);
    ValidationStats {
        errors: load(Bucket::Error),
        warnings: load(Bucket::Warning),
        info: load(Bucket::Info),
        verbose: load(Bucket::Verbose),
    }
}

/// Message ids seen more than once, most frequent first
fn repeated_messages(limit: usize) -> Vec<(String, u32)> {
    let mut repeated: Vec<(String, u32)> = match MESSAGE_COUNTS.lock() {
        Ok(counts) => counts
            .iter()
            .flatten()
            .filter(|&(_, &count)| count > 1)
            .map(|(id, &count)| (id.clone(), count))
            .collect(),
        Err(_) => Vec::new(),
    };
    repeated.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    repeated.truncate(limit);
    repeated
}

/// Print the validation counters and the noisiest message ids to stdout
pub fn print_validation_stats_report() {
    let stats = validation_stats();
    if stats.total() == 0 {
        println!("{} no validation messages", "[validation]".green().bold());
        return;
    }

    println!(
        "{} {} message(s): {} error(s), {} warning(s), {} info, {} verbose",
        "[validation]".bright_blue().bold(),
        stats.total(),
        stats.errors.to_string().red().bold(),
        stats.warnings.to_string().yellow(),
        stats.info,
        stats.verbose
    );
    for (id, count) in repeated_messages(5) {
        println!("    {:>5}x {}", count, id);
    }
}

fn accepts(severity: DebugSeverity, message_severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> bool {
    message_severity.intersects(severity_flags(severity))
}

/// Vulkan debug messenger callback
pub(crate) unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    let severity = match DEBUG_SEVERITY.lock().ok().and_then(|current| *current) {
        Some(severity) => severity,
        None => return vk::FALSE,
    };
    if !accepts(severity, message_severity) || p_callback_data.is_null() {
        return vk::FALSE;
    }

    let callback_data = *p_callback_data;
    let message_id_name = lossy(callback_data.p_message_id_name, "<no id>");
    let message = lossy(callback_data.p_message, "<empty>");

    let kind = match message_type {
        t if t.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) => "validation",
        t if t.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) => "performance",
        _ => "general",
    };

    if let Ok(mut counts) = MESSAGE_COUNTS.lock() {
        *counts.get_or_insert_with(FxHashMap::default).entry(message_id_name.to_string()).or_insert(0) += 1;
    }

    let bucket = Bucket::of(message_severity);
    bucket.bump();
    match bucket {
        Bucket::Error => inflight_error!(SOURCE, "[{}] {}: {}", kind, message_id_name, message),
        Bucket::Warning => inflight_warn!(SOURCE, "[{}] {}: {}", kind, message_id_name, message),
        Bucket::Info => inflight_info!(SOURCE, "[{}] {}: {}", kind, message_id_name, message),
        Bucket::Verbose => inflight_trace!(SOURCE, "[{}] {}: {}", kind, message_id_name, message),
    }

    vk::FALSE
}

unsafe fn lossy<'a>(ptr: *const std::os::raw::c_char, fallback: &'a str) -> Cow<'a, str> {
    if ptr.is_null() {
        Cow::Borrowed(fallback)
    } else {
        CStr::from_ptr(ptr).to_string_lossy()
    }
}
