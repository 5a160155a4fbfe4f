use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 设备信息
///
/// 来自 `configs/devices.json` 的一条记录；在一个轮询周期内不可变，
/// 每个周期开始时从注册表重新读取。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// 设备 ID（全局唯一）
    pub id: String,

    /// 设备名称
    pub name: String,

    /// 设备 IP 地址
    pub ip: String,

    /// ModBus/TCP 端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 从站 ID
    #[serde(default = "default_unit_id")]
    pub unit_id: u8,

    /// 是否启用
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// 寄存器列表
    #[serde(default)]
    pub registers: Vec<Register>,
}

fn default_port() -> u16 {
    502
}

fn default_unit_id() -> u8 {
    1
}

fn default_enabled() -> bool {
    true
}

fn default_length() -> u16 {
    1
}

/// 寄存器定义
///
/// `register_type` 保持原始字符串，轮询时再解析；未知类型会被跳过并告警，
/// 而不是让整个设备配置解析失败。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Register {
    /// 寄存器名称（设备内唯一）
    pub name: String,

    /// 起始地址
    pub address: u16,

    /// 寄存器类型：holding / input / coil / discrete
    #[serde(rename = "type")]
    pub register_type: String,

    /// 读取长度
    #[serde(default = "default_length")]
    pub length: u16,

    /// 是否启用
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// 数据类型（供报表层使用，轮询不解释）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,

    /// 单位
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// 倍率
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
}

impl Register {
    /// 解析寄存器类型
    pub fn kind(&self) -> Option<RegisterKind> {
        RegisterKind::from_str(&self.register_type)
    }
}

/// 寄存器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterKind {
    /// 保持寄存器（可读写）
    Holding,

    /// 输入寄存器（只读）
    Input,

    /// 线圈（可读写）
    Coil,

    /// 离散输入（只读）
    Discrete,
}

impl RegisterKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "holding" => Some(Self::Holding),
            "input" => Some(Self::Input),
            "coil" => Some(Self::Coil),
            "discrete" | "discrete_input" => Some(Self::Discrete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RegisterKind::Holding => "holding",
            RegisterKind::Input => "input",
            RegisterKind::Coil => "coil",
            RegisterKind::Discrete => "discrete",
        }
    }
}

/// 一次读取的原始值
///
/// 字寄存器返回 u16 数组，位寄存器返回 bool 数组。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegisterValue {
    Words(Vec<u16>),
    Bits(Vec<bool>),
}

/// 一条读数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// 原始值数组
    pub value: RegisterValue,

    /// 读取时间
    pub timestamp: DateTime<Utc>,

    /// 寄存器地址
    pub address: u16,

    /// 寄存器类型
    #[serde(rename = "type")]
    pub kind: RegisterKind,
}

/// 设备数据快照：寄存器名称 -> 最新读数
pub type DeviceSnapshot = HashMap<String, Reading>;
