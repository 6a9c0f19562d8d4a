// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use crate::{ErrorKind, IpamError};

/// `CNI_ARGS` key holding the addresses already resolved by the
/// orchestrator, as a JSON array of [crate::IpInfo].
pub const IP_INFOS_KEY: &str = "IPInfos";

const PAIR_SEPARATOR: char = ';';
const KEY_VALUE_SEPARATOR: char = '=';

/// Parse `CNI_ARGS` in the form of `KEY1=VAL1;KEY2=VAL2`.
///
/// Empty segments are ignored. Each segment is split at its first `=`, so
/// the value itself may hold `=`. When a key repeats, the last one wins.
pub fn parse_cni_args(
    args: &str,
) -> Result<HashMap<String, String>, IpamError> {
    let mut ret = HashMap::new();
    for pair in args.split(PAIR_SEPARATOR) {
        if pair.is_empty() {
            continue;
        }
        match pair.split_once(KEY_VALUE_SEPARATOR) {
            Some((key, value)) => {
                ret.insert(key.to_string(), value.to_string());
            }
            None => {
                return Err(IpamError::new(
                    ErrorKind::InvalidArgument,
                    format!("invalid CNI_ARGS pair \"{pair}\""),
                ));
            }
        }
    }
    Ok(ret)
}
