// src/types.rs
use crate::scanner::ScanReport;

// 前端发给扫描线程的命令
#[derive(Clone, Debug)]
pub enum ScanCommand {
    ScanAll,
    ScanChannel(usize),
    Shutdown,
}

// 扫描线程发给前端的消息
#[derive(Clone, Debug)]
pub enum ScanEvent {
    Log(String),
    Busy(bool),
    // 单个信道完成 (成功或失败), 前端据此重绘
    ChannelDone { index: usize, ok: bool },
    SweepDone(ScanReport),
    // 非设备类错误, 扫描被中止
    Fatal(String),
}

// 前端形态: 浏览 (扫描后翻页) / 逐个推进 / 批处理出图
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum FrontEnd {
    Browse,
    Advance,
    Batch,
}
