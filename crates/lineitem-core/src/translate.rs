//! Offline English to Chinese translation of record descriptions.
//!
//! Covers common hardware and software terms. Text the dictionary cannot fully
//! translate is left for a remote translation service.

use lazy_static::lazy_static;
use regex::{NoExpand, Regex};
use tracing::trace;

/// Technical terms in replacement order.
pub const TECHNICAL_TERMS: &[(&str, &str)] = &[
    ("cable", "电缆"),
    ("wire", "电线"),
    ("connector", "连接器"),
    ("adapter", "适配器"),
    ("charger", "充电器"),
    ("battery", "电池"),
    ("screen", "屏幕"),
    ("display", "显示器"),
    ("keyboard", "键盘"),
    ("mouse", "鼠标"),
    ("speaker", "扬声器"),
    ("microphone", "麦克风"),
    ("camera", "摄像头"),
    ("sensor", "传感器"),
    ("processor", "处理器"),
    ("memory", "内存"),
    ("storage", "存储"),
    ("hard drive", "硬盘"),
    ("solid state drive", "固态硬盘"),
    ("motherboard", "主板"),
    ("graphics card", "显卡"),
    ("power supply", "电源"),
    ("cooling fan", "散热风扇"),
    ("heat sink", "散热器"),
    ("case", "机箱"),
    ("monitor", "显示器"),
    ("printer", "打印机"),
    ("scanner", "扫描仪"),
    ("router", "路由器"),
    ("switch", "交换机"),
    ("modem", "调制解调器"),
    ("ethernet", "以太网"),
    ("wifi", "无线网络"),
    ("bluetooth", "蓝牙"),
    ("usb", "USB"),
    ("hdmi", "HDMI"),
    ("audio", "音频"),
    ("video", "视频"),
    ("software", "软件"),
    ("hardware", "硬件"),
    ("driver", "驱动程序"),
    ("firmware", "固件"),
    ("operating system", "操作系统"),
    ("application", "应用程序"),
    ("database", "数据库"),
    ("server", "服务器"),
    ("network", "网络"),
    ("internet", "互联网"),
    ("website", "网站"),
    ("email", "电子邮件"),
    ("file", "文件"),
    ("folder", "文件夹"),
    ("document", "文档"),
    ("image", "图像"),
    ("photo", "照片"),
    ("picture", "图片"),
    ("music", "音乐"),
    ("sound", "声音"),
];

lazy_static! {
    static ref TERM_PATTERNS: Vec<(Regex, &'static str)> = TECHNICAL_TERMS
        .iter()
        .map(|(english, chinese)| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(english));
            (Regex::new(&pattern).unwrap(), *chinese)
        })
        .collect();
}

/// Translate `text` with the term dictionary alone.
///
/// Returns `None` when English words remain after substitution, meaning the
/// caller should fall back to a full translation service. Blank text comes
/// back unchanged.
pub fn translate_with_dictionary(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return Some(text.to_string());
    }

    let lower = text.to_lowercase();
    if let Some((_, chinese)) = TECHNICAL_TERMS.iter().find(|(english, _)| *english == lower) {
        trace!("Dictionary hit for {:?}", text);
        return Some((*chinese).to_string());
    }

    let mut replaced = text.to_string();
    for (pattern, chinese) in TERM_PATTERNS.iter() {
        if pattern.is_match(&replaced) {
            replaced = pattern.replace_all(&replaced, NoExpand(*chinese)).into_owned();
        }
    }

    if replaced != text && !replaced.chars().any(|c| c.is_ascii_alphabetic()) {
        trace!("Dictionary translated {:?} to {:?}", text, replaced);
        Some(replaced)
    } else {
        None
    }
}
