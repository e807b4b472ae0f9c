//! CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 자격증명 등록 및 관리
//! - 저장된 자격증명으로 터미널 로그인

pub mod commands;
