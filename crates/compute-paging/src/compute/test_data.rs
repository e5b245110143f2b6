use chrono::NaiveDateTime;
use serde_json::json;

use super::{AbsoluteLimit, ExtraSpecs, Flavor, Server, ServerUsage};

pub const TENANT_ID: &str = "1";
pub const OTHER_TENANT_ID: &str = "2";
pub const SERVER_ID: &str = "b5b3e7a0-3d5b-4a5c-9a49-8a1b1f2a4c1d";
pub const HOURS: f64 = 5.0;

pub fn servers() -> Vec<Server> {
    serde_json::from_value(json!([
        {
            "id": SERVER_ID,
            "name": "server_1",
            "status": "ACTIVE",
            "tenant_id": TENANT_ID,
            "user_id": "1",
            "image": {"id": "1"},
            "flavor": {"id": "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa"},
            "created": "2012-06-01T00:00:00Z",
            "locked": false
        },
        {
            "id": "0a1b2c3d-0000-4000-8000-000000000002",
            "name": "server_2",
            "status": "BUILD",
            "tenant_id": TENANT_ID,
            "user_id": "1",
            "image": "",
            "flavor": {"id": "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa"},
            "locked": true
        },
        {
            "id": "0a1b2c3d-0000-4000-8000-000000000003",
            "name": "server_3",
            "status": "ACTIVE",
            "tenant_id": OTHER_TENANT_ID,
            "user_id": "2",
            "image": {"id": "2"},
            "flavor": {"id": "bbbbbbbb-bbbb-bbbb-bbbb-bbbbbbbbbbbb"},
            "description": "from the other tenant"
        },
        {
            "id": "0a1b2c3d-0000-4000-8000-000000000004",
            "name": "server_4",
            "status": "SHUTOFF",
            "tenant_id": OTHER_TENANT_ID,
            "user_id": "2",
            "image": {"id": "2"},
            "flavor": {"id": "bbbbbbbb-bbbb-bbbb-bbbb-bbbbbbbbbbbb"}
        }
    ]))
    .unwrap()
}

pub fn flavors() -> Vec<Flavor> {
    serde_json::from_value(json!([
        {
            "id": "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa",
            "name": "m1.tiny",
            "vcpus": 1,
            "disk": 0,
            "ram": 512,
            "swap": 0,
            "OS-FLV-EXT-DATA:ephemeral": 0,
            "os-flavor-access:is_public": true
        },
        {
            "id": "bbbbbbbb-bbbb-bbbb-bbbb-bbbbbbbbbbbb",
            "name": "m1.massive",
            "vcpus": 1000,
            "disk": 1024,
            "ram": 10000,
            "swap": 0,
            "OS-FLV-EXT-DATA:ephemeral": 2048,
            "os-flavor-access:is_public": true
        },
        {
            "id": "dddddddd-dddd-dddd-dddd-dddddddddddd",
            "name": "m1.secret",
            "vcpus": 1000,
            "disk": 1024,
            "ram": 10000,
            "swap": 0,
            "OS-FLV-EXT-DATA:ephemeral": 2048,
            "os-flavor-access:is_public": false
        },
        {
            "id": "eeeeeeee-eeee-eeee-eeee-eeeeeeeeeeee",
            "name": "m1.metadata",
            "vcpus": 1000,
            "disk": 1024,
            "ram": 10000,
            "swap": 0,
            "OS-FLV-EXT-DATA:ephemeral": 2048,
            "os-flavor-access:is_public": true
        },
        {
            "id": "ffffffff-ffff-ffff-ffff-ffffffffffff",
            "name": "m1.small",
            "vcpus": 1,
            "disk": 20,
            "ram": 2048,
            "swap": "",
            "os-flavor-access:is_public": true
        }
    ]))
    .unwrap()
}

pub fn extra_specs() -> ExtraSpecs {
    [
        ("quota:disk_read_bytes_sec".to_owned(), "10000".to_owned()),
        ("hw:cpu_policy".to_owned(), "dedicated".to_owned()),
    ]
    .into_iter()
    .collect()
}

pub fn period() -> (NaiveDateTime, NaiveDateTime) {
    (
        NaiveDateTime::parse_from_str("2012-10-01T00:00:00", "%Y-%m-%dT%H:%M:%S").unwrap(),
        NaiveDateTime::parse_from_str("2012-11-01T00:00:00", "%Y-%m-%dT%H:%M:%S").unwrap(),
    )
}

/// Instance ids of the usages of [TENANT_ID], in report order
pub fn tenant_instance_ids() -> [&'static str; 2] {
    [
        "063cf7f3-ded1-4297-bc4c-31eae876cc93",
        "063cf7f3-ded1-4297-bc4c-31eae876cc94",
    ]
}

pub fn server_usages() -> Vec<ServerUsage> {
    let [first, second] = tenant_instance_ids();
    serde_json::from_value(json!([
        {
            "instance_id": first,
            "tenant_id": TENANT_ID,
            "name": "server_1",
            "hours": HOURS,
            "memory_mb": 512,
            "local_gb": 0,
            "vcpus": 1,
            "flavor": "m1.tiny",
            "state": "active",
            "started_at": "2012-10-08T20:10:44.587336",
            "ended_at": null,
            "uptime": 18000
        },
        {
            "instance_id": "5bf63a5c-3f7b-4d67-9f33-9e0c38f3c2c1",
            "tenant_id": OTHER_TENANT_ID,
            "name": "server_3",
            "hours": HOURS,
            "memory_mb": 10000,
            "local_gb": 1024,
            "vcpus": 1000,
            "flavor": "m1.massive",
            "state": "active",
            "started_at": "2012-10-09T08:00:00",
            "ended_at": null,
            "uptime": 18000
        },
        {
            "instance_id": second,
            "tenant_id": TENANT_ID,
            "name": "server_2",
            "hours": HOURS,
            "memory_mb": 512,
            "local_gb": 0,
            "vcpus": 1,
            "flavor": "m1.tiny",
            "state": "terminated",
            "started_at": "2012-10-10T08:00:00",
            "ended_at": "2012-10-10T13:00:00",
            "uptime": 18000
        }
    ]))
    .unwrap()
}

pub fn limits() -> Vec<AbsoluteLimit> {
    [
        ("maxTotalCores", -1),
        ("maxTotalInstances", 10),
        ("totalInstancesUsed", -1),
        ("totalCoresUsed", -1),
        ("totalRAMUsed", -2048),
        ("totalSecurityGroupsUsed", 1),
        ("totalFloatingIpsUsed", 0),
    ]
    .into_iter()
    .map(|(name, value)| AbsoluteLimit {
        name: name.to_owned(),
        value,
    })
    .collect()
}
