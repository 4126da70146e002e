#![no_main]

use causanet::config::DiscoveryConfig;
use causanet::discovery::discover;
use causanet::event_log::EventLog;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing must reject malformed logs with an error, never a panic
        let _ = EventLog::parse_json(input);

        if let Ok(log) = EventLog::parse_delimited(input, ';') {
            // Whatever parses must also survive discovery
            for traces in log.into_trace_sets().values() {
                let _ = discover(traces, &DiscoveryConfig::default());
            }
        }
    }
});
